//! Supervision core for launch-declared child processes.
//!
//! A launch configuration declares a set of nodes (name, namespace, package,
//! executable, respawn flag, launch prefix, arguments). This crate owns the
//! part between that configuration and the operator-facing front-end:
//!
//! - [`NodeSpec`]: the resolved description of one node to run.
//! - [`ProcessHandle`](supervision::ProcessHandle): one OS child process
//!   lifecycle (start, liveness polling, graceful-then-forceful stop).
//! - [`NodeSupervisor`](supervision::NodeSupervisor): the per-node state
//!   machine (`Stopped → Starting → Running → Stopping → Died`) with the
//!   auto-respawn policy.
//! - [`SupervisionController`]: the ordered supervisor collection, bulk
//!   start/stop, the periodic reconciliation tick, and the cooperative
//!   control loop.
//!
//! The presentation layer is external: it consumes the [`StateEvent`] stream
//! and feeds [`ControlCommand`]s back into the controller. The `run`
//! subcommand of the bundled binary is a minimal headless stand-in that logs
//! every event.
//!
//! ## Example
//! ```no_run
//! use launch_supervisor::{
//!     NodeSpec, RunContext, SupervisionController, SupervisorConfig,
//! };
//! use std::collections::HashMap;
//!
//! # async fn demo() -> Result<(), launch_supervisor::SupervisionError> {
//! let spec = NodeSpec {
//!     name: "talker".to_string(),
//!     namespace: "/demo".to_string(),
//!     package: None,
//!     executable: "talker".to_string(),
//!     respawn: true,
//!     launch_prefix: String::new(),
//!     args: vec![],
//!     env: HashMap::new(),
//! };
//! let context = RunContext::new("http://localhost:11311");
//! let (mut controller, mut events) =
//!     SupervisionController::new(vec![spec], context, SupervisorConfig::default())?;
//! controller.start_all().await;
//! controller.reconcile().await;
//! while let Ok(event) = events.try_recv() {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod execution;
pub mod launch;
pub mod supervision;

pub use error::SupervisionError;
pub use launch::{load_launch_config, LaunchConfig, NodeRecord, NodeSpec, RunContext};
pub use supervision::{
    ControlCommand, NodeStatus, NodeSupervisor, StateEvent, SupervisionController,
    SupervisorConfig, SupervisorState,
};
