//! `acrelay` command line entry point
//!
//! Loads (or creates) the configuration file, starts the relay against the
//! simulator's shared memory and runs until Ctrl+C or a fatal error.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use acrelay::{Relay, RelayConfig};

#[derive(Debug, Parser)]
#[command(name = "acrelay", version, about = "Relay Assetto Corsa telemetry to a UDP sink")]
struct Cli {
    /// Configuration file, created with defaults when missing.
    #[arg(long, env = "ACRELAY_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = RelayConfig::load_or_init(&cli.config);
    info!(
        config = %cli.config.display(),
        sink = %config.sink.target(),
        "Starting acrelay"
    );

    let relay = Relay::connect_shared_memory(config)
        .await
        .context("failed to start telemetry relay")?;

    tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown requested");
            relay.stop();
        }
        _ = relay.stopped() => {}
    }

    if let Err(e) = relay.join().await {
        error!(error = %e, suggestions = ?e.recovery_suggestions(), "Relay stopped");
        return Err(e).context("telemetry relay failed");
    }

    info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        _ = signal::ctrl_c() => {},
        _ = async {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{SignalKind, signal};
                match signal(SignalKind::terminate()) {
                    Ok(mut term) => {
                        term.recv().await;
                    }
                    Err(_) => std::future::pending::<()>().await,
                }
            }
            #[cfg(not(unix))]
            std::future::pending::<()>().await
        } => {},
    }
}
