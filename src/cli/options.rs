use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Supervise child processes declared in a launch configuration
#[derive(Parser)]
#[command(name = "launch_supervisor")]
#[command(version)]
#[command(about = "Supervise child processes declared in a launch configuration")]
#[command(after_help = "Examples:\n  \
    launch_supervisor run --input-file nodes.json\n  \
    launch_supervisor run --input-file nodes.json --tick-interval-ms 50\n  \
    launch_supervisor check --input-file nodes.json")]
#[command(arg_required_else_help = true)]
pub struct Options {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start all nodes and supervise them until interrupted
    Run(RunArgs),

    /// Validate a launch configuration without starting anything
    Check(CheckArgs),
}

/// Arguments for the supervision loop
#[derive(Args)]
pub struct RunArgs {
    /// Path to the launch configuration JSON file
    #[arg(long, default_value = "nodes.json")]
    pub input_file: PathBuf,

    /// Reconciliation tick interval in milliseconds
    #[arg(long, default_value_t = 100)]
    pub tick_interval_ms: u64,

    /// Grace period in milliseconds between SIGTERM and SIGKILL
    #[arg(long, default_value_t = 2000)]
    pub termination_timeout_ms: u64,

    /// Master registry URI exported to every node (overridden by the
    /// configuration file when it carries one)
    #[arg(long, default_value = "http://localhost:11311")]
    pub master_uri: String,

    /// Root directory for package-relative executables
    #[arg(long)]
    pub install_root: Option<PathBuf>,
}

/// Arguments for configuration validation
#[derive(Args)]
pub struct CheckArgs {
    /// Path to the launch configuration JSON file
    #[arg(long, default_value = "nodes.json")]
    pub input_file: PathBuf,
}
