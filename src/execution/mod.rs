//! Building spawnable invocations from node specifications.

pub mod node_cmdline;

pub use node_cmdline::NodeCommandLine;
