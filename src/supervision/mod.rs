//! Process supervision core.
//!
//! One [`NodeSupervisor`] per declared node drives the lifecycle state
//! machine over its [`ProcessHandle`]; the [`SupervisionController`] owns the
//! ordered collection and runs the reconciliation loop.

pub mod controller;
pub mod events;
pub mod node;
pub mod process;

pub use controller::SupervisionController;
pub use events::{ControlCommand, StateEvent};
pub use node::{NodeStatus, NodeSupervisor, SupervisorState};
pub use process::ProcessHandle;

use std::time::Duration;

/// Timing knobs for the supervision loop.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorConfig {
    /// Interval between reconciliation ticks.
    pub tick_interval: Duration,
    /// Grace period between SIGTERM and SIGKILL when stopping a node.
    pub termination_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            termination_timeout: Duration::from_secs(2),
        }
    }
}
