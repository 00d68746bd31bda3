use eyre::Context;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};
use tracing::debug;

/// The serialization format for a launch configuration dump.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LaunchConfig {
    /// Master registry URI exported to every node. Falls back to the
    /// front-end's own default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_uri: Option<String>,
    pub node: Vec<NodeRecord>,
}

/// The serialization format for one node declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeRecord {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Package the executable belongs to; `None` for bare executables
    /// resolved from `PATH`.
    pub package: Option<String>,
    pub executable: String,
    #[serde(default)]
    pub respawn: bool,
    /// Command prefix (debugger/profiler wrapper) prepended to the
    /// invocation.
    #[serde(default)]
    pub launch_prefix: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub env: Option<Vec<(String, String)>>,
}

fn default_namespace() -> String {
    "/".to_string()
}

/// Read and deserialize a launch configuration dump.
pub fn load_launch_config(path: &Path) -> eyre::Result<LaunchConfig> {
    debug!("Opening launch configuration: {}", path.display());
    let file =
        File::open(path).wrap_err_with(|| format!("unable to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let config: LaunchConfig = serde_json::from_reader(reader)
        .wrap_err_with(|| format!("malformed launch configuration in {}", path.display()))?;
    debug!("Loaded {} node record(s)", config.node.len());

    Ok(config)
}
