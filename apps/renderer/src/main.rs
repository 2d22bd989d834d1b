use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use bridge_core::{compose, ChannelBoundary};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod headless;
mod stdio;

/// How long pending output may take to drain once the shell stopped.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(about = "Renderer side of the desktop window, speaking JSON lines on stdio")]
struct Args {
    /// Settings file, `renderer.toml` in the working directory by default.
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON file holding the user preferences.
    #[arg(long)]
    preferences: Option<PathBuf>,
    /// Log filter directive, e.g. `info,bridge_core=debug`.
    #[arg(long)]
    log_filter: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings(args.config.as_deref());
    settings.override_with(args.preferences, args.log_filter);

    // stdout carries the boundary, so logs go to stderr.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let result = runtime.block_on(run(settings));
    // A blocking stdin read cannot be cancelled; don't wait for it.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run(settings: config::RendererSettings) -> Result<()> {
    let (boundary, outbound_rx) = ChannelBoundary::channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let shell = compose(
        Arc::new(boundary),
        headless::collaborators(settings.preferences_file.clone()),
        settings.to_bridge_settings(),
    );

    let writer = tokio::spawn(stdio::pump_outbound(tokio::io::stdout(), outbound_rx));
    let reader = tokio::spawn(stdio::pump_inbound(tokio::io::stdin(), inbound_tx));
    info!(
        loader_fade_ms = settings.loader_fade_ms,
        call_timeout_ms = ?settings.call_timeout_ms,
        "renderer: waiting for window state"
    );

    let outcome = tokio::select! {
        result = shell.run(inbound_rx) => result.context("renderer shell stopped"),
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            info!("renderer: interrupted, window reloading");
            shell.window_reloading().context("failed to announce reload")
        }
    };

    reader.abort();
    drop(shell);
    match tokio::time::timeout(SHUTDOWN_GRACE, writer).await {
        Ok(Ok(Err(err))) => warn!(error = %err, "renderer: boundary output failed"),
        Ok(Err(err)) => warn!(error = %err, "renderer: output task failed"),
        Err(_) => warn!("renderer: boundary output did not drain in time"),
        Ok(Ok(Ok(()))) => {}
    }
    outcome
}
