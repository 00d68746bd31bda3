//! OS process lifecycle for one supervised node.

use crate::{
    error::SupervisionError,
    execution::NodeCommandLine,
    launch::{NodeSpec, RunContext},
};
use std::time::Duration;
use tokio::process::Child;
use tracing::{debug, warn};

/// One spawnable child process built from a node spec.
///
/// A handle is reusable across respawns as long as the launch parameters are
/// unchanged; a launch-prefix edit requires discarding it and building a new
/// one from the mutated spec (an in-flight process is never mutated in
/// place).
pub struct ProcessHandle {
    /// Resolved node name, for logs.
    name: String,
    cmdline: NodeCommandLine,
    /// The prefix this handle's command line was built with.
    launch_prefix: String,
    child: Option<Child>,
    pid: Option<u32>,
    started: bool,
    stopped: bool,
    exit_code: Option<i32>,
}

impl ProcessHandle {
    /// Build a handle from the spec as it is right now.
    pub fn new(spec: &NodeSpec, context: &RunContext) -> Result<Self, SupervisionError> {
        let cmdline = NodeCommandLine::from_spec(spec, context)?;
        Ok(Self {
            name: spec.full_name(),
            cmdline,
            launch_prefix: spec.launch_prefix.clone(),
            child: None,
            pid: None,
            started: false,
            stopped: false,
            exit_code: None,
        })
    }

    /// The launch prefix this handle was built with. A spec whose prefix no
    /// longer matches needs a fresh handle before the next start.
    pub fn launch_prefix(&self) -> &str {
        &self.launch_prefix
    }

    pub fn cmdline(&self) -> &NodeCommandLine {
        &self.cmdline
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn started(&self) -> bool {
        self.started
    }

    /// Whether a deliberate stop was requested (distinct from dying).
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// Exit code of the last run, once known. `None` while running or when
    /// the process was killed by a signal.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Spawn the node process. Reusable after the previous process exited.
    pub async fn start(&mut self) -> Result<u32, SupervisionError> {
        let mut command = self.cmdline.to_command();
        let child = command
            .spawn()
            .map_err(|source| SupervisionError::LaunchFailure {
                name: self.name.clone(),
                source,
            })?;
        let pid = child.id().expect("freshly spawned child should have a PID");

        self.child = Some(child);
        self.pid = Some(pid);
        self.started = true;
        self.stopped = false;
        self.exit_code = None;

        debug!("[{}] spawned with PID {}", self.name, pid);
        Ok(pid)
    }

    /// Whether the process is currently running.
    ///
    /// A handle that was never started reports not-alive rather than
    /// erroring; callers rely on this explicit guard.
    pub fn is_alive(&mut self) -> bool {
        if !self.started {
            return false;
        }
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                self.exit_code = status.code();
                self.child = None;
                false
            }
            Err(err) => {
                warn!("[{}] failed to poll process: {}", self.name, err);
                false
            }
        }
    }

    /// True when the process was started, was not deliberately stopped, and
    /// is no longer alive.
    pub fn has_died(&mut self) -> bool {
        self.started && !self.stopped && !self.is_alive()
    }

    /// Request termination and wait for the process to exit.
    ///
    /// Graceful-then-forceful: SIGTERM to the node's process group, bounded
    /// wait, then SIGKILL if the process is still alive after the timeout.
    /// Idempotent; calling on an already-stopped handle is a no-op. Returns
    /// the recorded exit code.
    pub async fn stop(&mut self, termination_timeout: Duration) -> Option<i32> {
        if self.stopped {
            return self.exit_code;
        }
        self.stopped = true;

        let Some(mut child) = self.child.take() else {
            // The process already exited on its own; the exit code was
            // captured by the last liveness poll.
            return self.exit_code;
        };

        #[cfg(unix)]
        if let Some(pid) = self.pid {
            signal_group(&self.name, pid, nix::sys::signal::Signal::SIGTERM);
        }
        #[cfg(not(unix))]
        {
            child.start_kill().ok();
        }

        match tokio::time::timeout(termination_timeout, child.wait()).await {
            Ok(Ok(status)) => {
                self.exit_code = status.code();
                debug!("[{}] exited with status {:?}", self.name, status);
            }
            Ok(Err(err)) => {
                warn!("[{}] failed to wait for process: {}", self.name, err);
            }
            Err(_) => {
                // Termination timeout: recovered locally by escalating, never
                // surfaced as an error.
                warn!(
                    "[{}] did not terminate within {:?}, escalating to SIGKILL",
                    self.name, termination_timeout
                );
                #[cfg(unix)]
                if let Some(pid) = self.pid {
                    signal_group(&self.name, pid, nix::sys::signal::Signal::SIGKILL);
                }
                if let Err(err) = child.kill().await {
                    warn!("[{}] failed to kill process: {}", self.name, err);
                }
                match child.wait().await {
                    Ok(status) => self.exit_code = status.code(),
                    Err(err) => warn!("[{}] failed to reap process: {}", self.name, err),
                }
            }
        }

        self.exit_code
    }
}

/// Signal an entire per-node process group.
#[cfg(unix)]
fn signal_group(name: &str, pid: u32, signal: nix::sys::signal::Signal) {
    use nix::{sys::signal::killpg, unistd::Pid};

    match killpg(Pid::from_raw(pid as i32), signal) {
        Ok(()) => debug!("[{}] sent {:?} to process group {}", name, signal, pid),
        Err(err) => warn!(
            "[{}] failed to signal process group {}: {}",
            name, pid, err
        ),
    }
}
