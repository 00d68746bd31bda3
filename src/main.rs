mod cli;

use clap::Parser;
use cli::options::{CheckArgs, Command, Options, RunArgs};
use eyre::Context;
use launch_supervisor::{
    load_launch_config, NodeSpec, RunContext, SupervisionController, SupervisorConfig,
};
use std::{path::Path, time::Duration};
use tracing::{debug, info};

fn main() -> eyre::Result<()> {
    let opts = Options::parse();

    // RUST_LOG takes precedence; default to INFO otherwise.
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt::init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    match opts.command {
        Command::Run(args) => handle_run(args),
        Command::Check(args) => handle_check(args),
    }
}

/// Load the configuration dump and turn its records into validated specs.
fn load_specs(path: &Path) -> eyre::Result<(Vec<NodeSpec>, Option<String>)> {
    let config = load_launch_config(path)?;
    let master_uri = config.master_uri;
    let specs = config
        .node
        .into_iter()
        .map(NodeSpec::from_record)
        .collect::<Result<Vec<_>, _>>()
        .wrap_err_with(|| format!("invalid launch configuration in {}", path.display()))?;
    Ok((specs, master_uri))
}

fn handle_check(args: CheckArgs) -> eyre::Result<()> {
    let (specs, _) = load_specs(&args.input_file)?;
    for spec in &specs {
        info!(
            "{}  executable={}  respawn={}",
            spec.full_name(),
            spec.executable,
            spec.respawn
        );
    }
    info!("{} node(s) OK", specs.len());
    Ok(())
}

fn handle_run(args: RunArgs) -> eyre::Result<()> {
    // Single-threaded cooperative scheduling: the reconciliation tick and
    // command handling interleave on one thread, so no two operations on the
    // same supervisor ever run concurrently.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build tokio runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: RunArgs) -> eyre::Result<()> {
    let (specs, config_master_uri) = load_specs(&args.input_file)?;

    let mut context = RunContext::new(config_master_uri.unwrap_or(args.master_uri));
    if let Some(root) = args.install_root {
        context = context.with_install_root(root);
    }
    info!("run id: {}", context.run_id);

    let config = SupervisorConfig {
        tick_interval: Duration::from_millis(args.tick_interval_ms),
        termination_timeout: Duration::from_millis(args.termination_timeout_ms),
    };

    let (mut controller, mut events) = SupervisionController::new(specs, context, config)?;

    // Headless stand-in for a presentation layer: log every state event.
    let event_logger = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Ok(json) = serde_json::to_string(&event) {
                debug!("event: {}", json);
            }
        }
    });

    controller.start_all().await;

    // SIGINT/SIGTERM flip the shutdown watch; the control loop stops all
    // nodes before returning, on every exit path.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        wait_for_termination_signal().await;
        info!("shutting down...");
        let _ = shutdown_tx.send(true);
    });

    // Commands would come from an embedding presentation layer; the headless
    // front-end keeps the channel open but idle.
    let (_command_tx, command_rx) = tokio::sync::mpsc::unbounded_channel();

    controller.run(command_rx, shutdown_rx).await;
    event_logger.abort();
    Ok(())
}

#[cfg(unix)]
async fn wait_for_termination_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint =
        signal(SignalKind::interrupt()).expect("failed to register SIGINT handler");
    let mut sigterm =
        signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");

    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_termination_signal() {
    tokio::signal::ctrl_c().await.ok();
}
