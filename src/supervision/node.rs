//! Per-node lifecycle state machine.

use super::{events::StateEvent, process::ProcessHandle};
use crate::{
    error::SupervisionError,
    launch::{NodeSpec, RunContext},
};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

/// Observable lifecycle state of one supervised node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorState {
    /// Not running; clean exit, deliberate stop, or never started
    Stopped,
    /// Spawn in progress
    Starting,
    /// Process is alive
    Running,
    /// Graceful termination in progress
    Stopping,
    /// Process exited with a nonzero code or was killed by a signal;
    /// terminal until a manual start unless respawn re-enters Starting
    Died,
}

impl SupervisorState {
    pub fn is_running(&self) -> bool {
        matches!(self, SupervisorState::Running)
    }
}

/// Status snapshot handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct NodeStatus {
    pub name: String,
    pub state: SupervisorState,
    pub spawn_count: u32,
    pub respawn: bool,
    pub launch_prefix: String,
}

/// Supervises one node: owns its mutable [`NodeSpec`] and its current
/// [`ProcessHandle`], drives the state machine, and emits a [`StateEvent`]
/// on every transition.
pub struct NodeSupervisor {
    name: String,
    spec: NodeSpec,
    context: RunContext,
    handle: ProcessHandle,
    state: SupervisorState,
    /// Total successful spawns. Monotonic for the lifetime of the
    /// application; survives handle replacement.
    spawn_count: u32,
    termination_timeout: Duration,
    events: UnboundedSender<StateEvent>,
}

impl NodeSupervisor {
    /// Validate the spec and build the initial process handle. A malformed
    /// spec refuses construction.
    pub fn new(
        spec: NodeSpec,
        context: RunContext,
        termination_timeout: Duration,
        events: UnboundedSender<StateEvent>,
    ) -> Result<Self, SupervisionError> {
        spec.validate()?;
        let handle = ProcessHandle::new(&spec, &context)?;
        Ok(Self {
            name: spec.full_name(),
            spec,
            context,
            handle,
            state: SupervisorState::Stopped,
            spawn_count: 0,
            termination_timeout,
            events,
        })
    }

    /// Fully resolved node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn spawn_count(&self) -> u32 {
        self.spawn_count
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    pub fn status(&self) -> NodeStatus {
        NodeStatus {
            name: self.name.clone(),
            state: self.state,
            spawn_count: self.spawn_count,
            respawn: self.spec.respawn,
            launch_prefix: self.spec.launch_prefix.clone(),
        }
    }

    pub fn set_respawn(&mut self, enabled: bool) {
        info!("[{}] respawn {}", self.name, if enabled { "on" } else { "off" });
        self.spec.respawn = enabled;
    }

    /// Stage a new launch prefix; it takes effect at the next start, when the
    /// process handle is rebuilt from the mutated spec.
    pub fn set_launch_prefix(&mut self, prefix: impl Into<String>) {
        self.spec.launch_prefix = prefix.into();
    }

    /// Start the node.
    ///
    /// With `restart` unset, a running node is left untouched (idempotent
    /// bulk-start semantics). With `restart` set, a running node is stopped
    /// first and started again, picking up any pending launch-prefix edit.
    pub async fn start(&mut self, restart: bool) -> Result<(), SupervisionError> {
        if self.state.is_running() {
            if !restart {
                debug!("[{}] already running, ignoring start", self.name);
                return Ok(());
            }
            self.state = SupervisorState::Stopping;
            self.emit(StateEvent::Stopping {
                name: self.name.clone(),
            });
            self.handle.stop(self.termination_timeout).await;
        }

        self.refresh_handle()?;
        self.spawn().await
    }

    /// Stop the node. No-op unless it is currently running.
    pub async fn stop(&mut self) {
        if !self.state.is_running() {
            debug!("[{}] not running, ignoring stop", self.name);
            return;
        }

        self.state = SupervisorState::Stopping;
        self.emit(StateEvent::Stopping {
            name: self.name.clone(),
        });

        let exit_code = self.handle.stop(self.termination_timeout).await;

        self.state = SupervisorState::Stopped;
        self.emit(StateEvent::Stopped {
            name: self.name.clone(),
            exit_code,
        });
        info!("[{}] stopped", self.name);
    }

    /// The reconciliation primitive: detect external death and apply the
    /// respawn policy.
    ///
    /// Death means the process was started, was not deliberately stopped,
    /// and is no longer alive. A clean (zero) exit code reports Stopped,
    /// anything else Died; respawn is gated solely on the respawn flag and
    /// is evaluated only here, at the moment of death detection.
    pub async fn check_process_status(&mut self) -> Result<(), SupervisionError> {
        if !self.handle.has_died() {
            return Ok(());
        }

        // Reap, then classify by exit code.
        let exit_code = self.handle.stop(self.termination_timeout).await;
        if exit_code == Some(0) {
            info!("[{}] process exited cleanly", self.name);
            self.state = SupervisorState::Stopped;
            self.emit(StateEvent::Stopped {
                name: self.name.clone(),
                exit_code,
            });
        } else {
            warn!("[{}] process died with exit code {:?}", self.name, exit_code);
            self.state = SupervisorState::Died;
            self.emit(StateEvent::Died {
                name: self.name.clone(),
                exit_code,
            });
        }

        if self.spec.respawn {
            info!("[{}] respawning", self.name);
            self.emit(StateEvent::Respawning {
                name: self.name.clone(),
            });
            self.spawn().await?;
        }

        Ok(())
    }

    /// Rebuild the process handle when the staged launch prefix differs from
    /// the one the current handle was built with.
    fn refresh_handle(&mut self) -> Result<(), SupervisionError> {
        if self.spec.launch_prefix != self.handle.launch_prefix() {
            debug!("[{}] launch prefix changed, recreating process handle", self.name);
            self.handle = ProcessHandle::new(&self.spec, &self.context)?;
        }
        Ok(())
    }

    async fn spawn(&mut self) -> Result<(), SupervisionError> {
        self.state = SupervisorState::Starting;
        self.emit(StateEvent::Starting {
            name: self.name.clone(),
        });

        match self.handle.start().await {
            Ok(pid) => {
                self.spawn_count += 1;
                self.state = SupervisorState::Running;
                self.emit(StateEvent::Started {
                    name: self.name.clone(),
                    pid,
                    spawn_count: self.spawn_count,
                });
                info!(
                    "[{}] started with PID {} (spawn #{})",
                    self.name, pid, self.spawn_count
                );
                Ok(())
            }
            Err(err) => {
                // A failed spawn is not a death: the node rests in Stopped
                // and is never retried automatically.
                error!("[{}] unable to start: {}", self.name, err);
                self.state = SupervisorState::Stopped;
                self.emit(StateEvent::Stopped {
                    name: self.name.clone(),
                    exit_code: None,
                });
                Err(err)
            }
        }
    }

    fn emit(&self, event: StateEvent) {
        // The receiver going away must never stall supervision.
        self.events.send(event).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::mpsc;

    fn sh_spec(name: &str, script: &str, respawn: bool) -> NodeSpec {
        NodeSpec {
            name: name.to_string(),
            namespace: "/".to_string(),
            package: None,
            executable: "sh".to_string(),
            respawn,
            launch_prefix: String::new(),
            args: vec!["-c".to_string(), script.to_string()],
            env: HashMap::new(),
        }
    }

    fn supervisor(
        spec: NodeSpec,
    ) -> (NodeSupervisor, mpsc::UnboundedReceiver<StateEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let supervisor = NodeSupervisor::new(
            spec,
            RunContext::new("http://localhost:11311"),
            Duration::from_secs(1),
            tx,
        )
        .unwrap();
        (supervisor, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<StateEvent>) -> Vec<StateEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_malformed_spec_refuses_construction() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = NodeSupervisor::new(
            sh_spec("", "exit 0", false),
            RunContext::new("http://localhost:11311"),
            Duration::from_secs(1),
            tx,
        );
        assert!(matches!(
            result,
            Err(SupervisionError::ConfigurationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_is_idempotent_while_running() {
        let (mut supervisor, _rx) = supervisor(sh_spec("a", "sleep 30", false));
        supervisor.start(false).await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Running);
        assert_eq!(supervisor.spawn_count(), 1);

        supervisor.start(false).await.unwrap();
        assert_eq!(supervisor.spawn_count(), 1);

        supervisor.stop().await;
    }

    #[tokio::test]
    async fn test_forced_restart_increments_spawn_count() {
        let (mut supervisor, _rx) = supervisor(sh_spec("a", "sleep 30", false));
        supervisor.start(false).await.unwrap();
        supervisor.start(true).await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Running);
        assert_eq!(supervisor.spawn_count(), 2);

        supervisor.stop().await;
    }

    #[tokio::test]
    async fn test_stop_twice_is_a_no_op() {
        let (mut supervisor, mut rx) = supervisor(sh_spec("a", "sleep 30", false));
        supervisor.start(false).await.unwrap();
        supervisor.stop().await;
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
        drain(&mut rx);

        supervisor.stop().await;
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_clean_exit_reports_stopped_without_respawn() {
        let (mut supervisor, _rx) = supervisor(sh_spec("a", "exit 0", false));
        supervisor.start(false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        supervisor.check_process_status().await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
        assert_eq!(supervisor.spawn_count(), 1);
    }

    #[tokio::test]
    async fn test_dirty_exit_reports_died_without_respawn() {
        let (mut supervisor, _rx) = supervisor(sh_spec("a", "exit 3", false));
        supervisor.start(false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        supervisor.check_process_status().await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Died);
        assert_eq!(supervisor.spawn_count(), 1);
    }

    #[tokio::test]
    async fn test_death_triggers_respawn_within_one_check() {
        let (mut supervisor, mut rx) = supervisor(sh_spec("a", "exit 3", true));
        supervisor.start(false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        supervisor.check_process_status().await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Running);
        assert_eq!(supervisor.spawn_count(), 2);

        let kinds: Vec<_> = drain(&mut rx)
            .iter()
            .map(|event| event.state())
            .collect();
        assert_eq!(
            kinds,
            vec![
                SupervisorState::Starting,
                SupervisorState::Running,
                SupervisorState::Died,
                SupervisorState::Starting, // respawning
                SupervisorState::Starting,
                SupervisorState::Running,
            ]
        );

        supervisor.stop().await;
    }

    #[tokio::test]
    async fn test_respawn_even_on_clean_exit_when_enabled() {
        // Respawn is gated on the flag alone, not on the exit code.
        let (mut supervisor, _rx) = supervisor(sh_spec("a", "exit 0", true));
        supervisor.start(false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        supervisor.check_process_status().await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Running);
        assert_eq!(supervisor.spawn_count(), 2);

        supervisor.stop().await;
    }

    #[tokio::test]
    async fn test_deliberate_stop_is_not_a_death() {
        let (mut supervisor, _rx) = supervisor(sh_spec("a", "sleep 30", true));
        supervisor.start(false).await.unwrap();
        supervisor.stop().await;

        // Respawn must not trigger for a stop the operator asked for.
        supervisor.check_process_status().await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
        assert_eq!(supervisor.spawn_count(), 1);
    }

    #[tokio::test]
    async fn test_prefix_edit_takes_effect_on_next_start() {
        // The script succeeds only when the prefix injected the variable,
        // proving the fresh handle was built from the edited spec.
        let (mut supervisor, _rx) =
            supervisor(sh_spec("a", r#"test "$WRAPPED" = yes"#, false));
        supervisor.start(false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        supervisor.check_process_status().await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Died);

        supervisor.set_launch_prefix("env WRAPPED=yes");
        supervisor.start(true).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        supervisor.check_process_status().await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
        assert_eq!(supervisor.spawn_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_spawn_leaves_supervisor_stopped() {
        let spec = NodeSpec {
            executable: "definitely-not-a-real-executable".to_string(),
            args: vec![],
            ..sh_spec("a", "", false)
        };
        let (mut supervisor, _rx) = supervisor(spec);

        let err = supervisor.start(false).await.unwrap_err();
        assert!(matches!(err, SupervisionError::LaunchFailure { .. }));
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
        assert_eq!(supervisor.spawn_count(), 0);

        // A failed start is not a death; reconciliation must not retry it.
        supervisor.check_process_status().await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
        assert_eq!(supervisor.spawn_count(), 0);
    }
}
