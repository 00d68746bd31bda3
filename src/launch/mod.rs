//! Launch configuration boundary.
//!
//! Parsing and validating launch files proper is an external concern; this
//! module only consumes the recorded dump (a JSON list of node records) and
//! turns it into validated [`NodeSpec`]s.

pub mod names;
pub mod record;
pub mod spec;

pub use record::{load_launch_config, LaunchConfig, NodeRecord};
pub use spec::{NodeSpec, RunContext};
