use super::{names, record::NodeRecord};
use crate::error::SupervisionError;
use std::{collections::HashMap, path::PathBuf};

/// Description of one node to supervise.
///
/// Everything except `launch_prefix` is fixed for the lifetime of the
/// application; the prefix may be edited between starts, which forces the
/// process handle to be rebuilt before the next spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub name: String,
    pub namespace: String,
    /// Package the executable belongs to; `None` for bare executables.
    pub package: Option<String>,
    pub executable: String,
    /// Restart the node automatically when it dies.
    pub respawn: bool,
    /// Command prefix prepended to the invocation (e.g. a debugger wrapper).
    pub launch_prefix: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl NodeSpec {
    /// Build and validate a spec from a configuration record.
    pub fn from_record(record: NodeRecord) -> Result<Self, SupervisionError> {
        let NodeRecord {
            name,
            namespace,
            package,
            executable,
            respawn,
            launch_prefix,
            args,
            env,
        } = record;

        let spec = Self {
            name,
            namespace,
            package,
            executable,
            respawn,
            launch_prefix,
            args,
            env: env.into_iter().flatten().collect(),
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Check that this spec can produce a valid invocation.
    pub fn validate(&self) -> Result<(), SupervisionError> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("node name is empty"));
        }
        if self.executable.trim().is_empty() {
            return Err(self.invalid("executable is empty"));
        }
        // Fail prefix edits here rather than at the next spawn.
        if let Err(err) = shell_words::split(&self.launch_prefix) {
            return Err(self.invalid(&format!("unparsable launch prefix: {err}")));
        }
        Ok(())
    }

    /// Fully resolved graph name (namespace joined unless the name is
    /// already global or private).
    pub fn full_name(&self) -> String {
        names::ns_join(&self.namespace, &self.name)
    }

    fn invalid(&self, reason: &str) -> SupervisionError {
        SupervisionError::ConfigurationError {
            name: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Process-wide identifiers initialized once at startup and injected into
/// every node at construction. Never modelled as mutable globals.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Identifier for this supervision run, exported to every node.
    pub run_id: String,
    /// Master registry URI exported to every node.
    pub master_uri: String,
    /// Root directory for package-relative executables. When absent,
    /// executables resolve through `PATH`.
    pub install_root: Option<PathBuf>,
}

impl RunContext {
    /// Create a context with a timestamp-derived run id.
    pub fn new(master_uri: impl Into<String>) -> Self {
        let run_id = format!(
            "run-{}",
            chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
        );
        Self {
            run_id,
            master_uri: master_uri.into(),
            install_root: None,
        }
    }

    pub fn with_install_root(mut self, root: PathBuf) -> Self {
        self.install_root = Some(root);
        self
    }
}
