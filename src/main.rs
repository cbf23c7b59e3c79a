//! swdev - live-reload client for the swdev dev server.

use anyhow::{Context, Result, anyhow, bail};
use clap::{ColorChoice, Parser};
use swdev::cli::{Cli, Commands};
use swdev::config::ClientConfig;
use swdev::revalidate::{RevalidateOutcome, Revalidator};
use swdev::{Coordinator, Environment, StartOptions, StartOutcome, log, logger};
use tokio::sync::mpsc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = ClientConfig::load(&cli)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async {
        match &cli.command {
            Commands::Start { .. } => start(&config).await,
            Commands::Revalidate { paths, .. } => revalidate(&config, paths).await,
        }
    })
}

// =============================================================================
// Start Command
// =============================================================================

/// Run the module with live reload until Ctrl+C.
async fn start(config: &ClientConfig) -> Result<()> {
    let Some(url) = config.module.url.clone() else {
        bail!("no module address: pass one to `swdev start` or set `module.url`");
    };

    let coordinator = Coordinator::new(config, Environment::native(config)?)?;

    let (stop_tx, mut stop_rx) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })
    .map_err(|e| anyhow!("failed to set Ctrl+C handler: {}", e))?;

    let options = StartOptions {
        nocache: config.module.nocache,
        ..Default::default()
    };
    match coordinator.start(&url, options).await {
        Ok(StartOutcome::Started(run_id)) => log!("swdev"; "running {} ({})", url, run_id),
        Ok(StartOutcome::AlreadyStarted) => {}
        Err(e) => {
            coordinator.stop().await;
            return Err(e.into());
        }
    }

    stop_rx.recv().await;
    log!("swdev"; "shutting down...");
    coordinator.stop().await;
    Ok(())
}

// =============================================================================
// Revalidate Command
// =============================================================================

async fn revalidate(config: &ClientConfig, paths: &[String]) -> Result<()> {
    let revalidator = Revalidator::new(
        reqwest::Client::new(),
        config.origin()?,
        &config.revalidate.endpoint,
        config.revalidate.timeout(),
    )?;

    match revalidator.request_revalidate(paths).await {
        RevalidateOutcome::Requested => Ok(()),
        RevalidateOutcome::Rejected(status) => bail!("dev server answered {status}"),
        RevalidateOutcome::Failed(reason) => bail!("revalidation failed: {reason}"),
    }
}
