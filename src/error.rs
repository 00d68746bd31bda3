//! Error types for the supervision core.
//!
//! Termination timeouts are deliberately absent: a stop that exceeds its
//! grace period escalates to SIGKILL and is logged, never surfaced as an
//! error.

use thiserror::Error;

/// Errors surfaced by the supervision core.
#[derive(Debug, Error)]
pub enum SupervisionError {
    /// The OS could not spawn the node process (missing executable, resource
    /// exhaustion). The node is left stopped and is not retried.
    #[error("failed to launch `{name}`: {source}")]
    LaunchFailure {
        /// Resolved node name
        name: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// The node specification cannot produce a valid invocation. Refused at
    /// construction; no supervisor is built for a malformed spec.
    #[error("invalid specification for `{name}`: {reason}")]
    ConfigurationError {
        /// Node name as declared (may be empty)
        name: String,
        /// What is wrong with the record
        reason: String,
    },

    /// A command referenced a node missing from the configuration.
    #[error("no node named `{name}` in the launch configuration")]
    UnknownNode {
        /// Requested node name
        name: String,
    },
}
