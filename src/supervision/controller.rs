//! The supervisor collection and the cooperative control loop.

use super::{
    events::{ControlCommand, StateEvent},
    node::{NodeStatus, NodeSupervisor},
    SupervisorConfig,
};
use crate::{
    error::SupervisionError,
    launch::{NodeSpec, RunContext},
};
use tokio::{
    sync::{mpsc, watch},
    time::MissedTickBehavior,
};
use tracing::{debug, error, info};

/// Owns the ordered set of node supervisors (declaration order) and drives
/// the periodic reconciliation loop.
pub struct SupervisionController {
    supervisors: Vec<NodeSupervisor>,
    config: SupervisorConfig,
}

impl SupervisionController {
    /// Build one supervisor per spec, in declaration order. Any malformed
    /// spec fails the whole construction; no supervisors are left behind.
    ///
    /// Returns the controller plus the state-event stream for the
    /// presentation layer.
    pub fn new(
        specs: Vec<NodeSpec>,
        context: RunContext,
        config: SupervisorConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<StateEvent>), SupervisionError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let supervisors = specs
            .into_iter()
            .map(|spec| {
                NodeSupervisor::new(
                    spec,
                    context.clone(),
                    config.termination_timeout,
                    event_tx.clone(),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((
            Self {
                supervisors,
                config,
            },
            event_rx,
        ))
    }

    /// Status snapshot of every node, in declaration order.
    pub fn statuses(&self) -> Vec<NodeStatus> {
        self.supervisors
            .iter()
            .map(NodeSupervisor::status)
            .collect()
    }

    /// Start every node that is not already running. Never disrupts a
    /// healthy node; per-node failures are logged and do not abort the rest.
    pub async fn start_all(&mut self) {
        info!("starting all nodes");
        for supervisor in &mut self.supervisors {
            if let Err(err) = supervisor.start(false).await {
                error!("failed to start {}: {}", supervisor.name(), err);
            }
        }
    }

    /// Stop every node in declaration order; no-op on stopped nodes.
    pub async fn stop_all(&mut self) {
        info!("stopping all nodes");
        for supervisor in &mut self.supervisors {
            supervisor.stop().await;
        }
    }

    /// One reconciliation tick over all supervisors in declaration order.
    ///
    /// A failure on one node (e.g. a respawn that cannot spawn) never aborts
    /// polling of its siblings.
    pub async fn reconcile(&mut self) {
        for supervisor in &mut self.supervisors {
            if let Err(err) = supervisor.check_process_status().await {
                error!("reconciliation failed for {}: {}", supervisor.name(), err);
            }
        }
    }

    /// Targeted start: forces a stop-then-start cycle even on a running
    /// node, picking up any pending launch-prefix edit.
    pub async fn start_node(&mut self, name: &str) -> Result<(), SupervisionError> {
        self.supervisor_mut(name)?.start(true).await
    }

    pub async fn stop_node(&mut self, name: &str) -> Result<(), SupervisionError> {
        self.supervisor_mut(name)?.stop().await;
        Ok(())
    }

    pub fn toggle_respawn(&mut self, name: &str, enabled: bool) -> Result<(), SupervisionError> {
        self.supervisor_mut(name)?.set_respawn(enabled);
        Ok(())
    }

    pub fn set_launch_prefix(
        &mut self,
        name: &str,
        prefix: impl Into<String>,
    ) -> Result<(), SupervisionError> {
        self.supervisor_mut(name)?.set_launch_prefix(prefix);
        Ok(())
    }

    /// Run the cooperative control loop: reconcile on a fixed tick,
    /// interleaved with presentation-layer commands and the shutdown signal.
    ///
    /// Every exit path stops all nodes before returning, so no child process
    /// outlives the controller.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<ControlCommand>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut tick = tokio::time::interval(self.config.tick_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.reconcile().await;
                }

                command = commands.recv() => {
                    match command {
                        Some(command) => self.dispatch(command).await,
                        None => {
                            debug!("command channel closed");
                            break;
                        }
                    }
                }

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        debug!("shutdown signal received");
                        break;
                    }
                }
            }
        }

        // Cleanup contract: no orphaned children on any exit path.
        self.stop_all().await;
        info!("all nodes stopped");
    }

    async fn dispatch(&mut self, command: ControlCommand) {
        let result = match command {
            ControlCommand::StartAll => {
                self.start_all().await;
                Ok(())
            }
            ControlCommand::StopAll => {
                self.stop_all().await;
                Ok(())
            }
            ControlCommand::Restart { name } => self.start_node(&name).await,
            ControlCommand::Stop { name } => self.stop_node(&name).await,
            ControlCommand::ToggleRespawn { name, enabled } => {
                self.toggle_respawn(&name, enabled)
            }
            ControlCommand::SetLaunchPrefix { name, prefix } => {
                self.set_launch_prefix(&name, prefix)
            }
        };
        if let Err(err) = result {
            error!("command failed: {}", err);
        }
    }

    fn supervisor_mut(&mut self, name: &str) -> Result<&mut NodeSupervisor, SupervisionError> {
        self.supervisors
            .iter_mut()
            .find(|supervisor| supervisor.name() == name)
            .ok_or_else(|| SupervisionError::UnknownNode {
                name: name.to_string(),
            })
    }
}
