use crate::{
    error::SupervisionError,
    launch::{NodeSpec, RunContext},
};
use itertools::chain;
use std::collections::HashMap;

/// The command line information to execute one supervised node.
///
/// Built once per process handle; a launch-prefix edit on the spec requires
/// building a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCommandLine {
    /// Launch-prefix words followed by the resolved executable.
    pub command: Vec<String>,
    /// Extra arguments declared in the launch configuration.
    pub user_args: Vec<String>,
    /// Name remappings appended as `key:=value` words.
    pub remaps: Vec<(String, String)>,
    /// Environment exported to the node.
    pub env: HashMap<String, String>,
}

impl NodeCommandLine {
    /// Construct from a node spec and the process-wide run context.
    pub fn from_spec(spec: &NodeSpec, context: &RunContext) -> Result<Self, SupervisionError> {
        let prefix_words =
            shell_words::split(&spec.launch_prefix).map_err(|err| {
                SupervisionError::ConfigurationError {
                    name: spec.name.clone(),
                    reason: format!("unparsable launch prefix: {err}"),
                }
            })?;

        let executable = resolve_executable(spec, context);
        let command: Vec<_> = chain!(prefix_words, [executable]).collect();

        let remaps = vec![
            ("__name".to_string(), spec.full_name()),
            ("__ns".to_string(), spec.namespace.clone()),
        ];

        let env: HashMap<_, _> = chain!(
            spec.env.iter().map(|(key, value)| (key.clone(), value.clone())),
            [
                ("LAUNCH_RUN_ID".to_string(), context.run_id.clone()),
                ("LAUNCH_MASTER_URI".to_string(), context.master_uri.clone()),
            ],
        )
        .collect();

        Ok(Self {
            command,
            user_args: spec.args.clone(),
            remaps,
            env,
        })
    }

    /// Create command line arguments.
    pub fn to_cmdline(&self) -> Vec<String> {
        chain!(
            self.command.iter().cloned(),
            self.user_args.iter().cloned(),
            self.remaps
                .iter()
                .map(|(name, value)| format!("{name}:={value}")),
        )
        .collect()
    }

    /// Create a command object ready to spawn.
    pub fn to_command(&self) -> tokio::process::Command {
        let cmdline = self.to_cmdline();
        let (program, args) = cmdline
            .split_first()
            .expect("command line must not be empty");
        let mut command = std::process::Command::new(program);
        command.args(args);
        command.envs(&self.env);

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;

            // Each node runs in its own process group so stopping it can
            // signal the node and its children together.
            command.process_group(0);

            // Set parent death signal to prevent orphan processes: if the
            // supervisor dies, the kernel sends SIGKILL to the children.
            unsafe {
                command.pre_exec(|| {
                    nix::sys::prctl::set_pdeathsig(nix::sys::signal::Signal::SIGKILL)
                        .map_err(std::io::Error::other)
                });
            }
        }

        tokio::process::Command::from(command)
    }
}

/// Resolve the program to execute. Package-relative executables are joined
/// under the install root; bare executables go through `PATH`.
fn resolve_executable(spec: &NodeSpec, context: &RunContext) -> String {
    match (&spec.package, &context.install_root) {
        (Some(package), Some(root)) => root
            .join(package)
            .join(&spec.executable)
            .to_string_lossy()
            .into_owned(),
        _ => spec.executable.clone(),
    }
}
