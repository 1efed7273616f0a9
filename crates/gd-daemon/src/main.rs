//! gdoor bridge daemon.

use anyhow::{Context, Result};
use gd_core::config::Config;
use tracing::info;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = load_config()?;
    gd_telemetry::logging::init("gd-daemon", &config.logging.level, config.logging.json);

    info!(version = env!("CARGO_PKG_VERSION"), "gdoor bridge starting");

    let daemon = gd_daemon::daemon::Daemon::new(config).await?;
    let shutdown = daemon.shutdown_handle();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        info!("ctrl-c received, initiating shutdown");
        shutdown.trigger();
    });

    daemon.run().await?;
    info!("gdoor bridge stopped");
    Ok(())
}

/// `GD_CONFIG` names an explicit file; otherwise `~/.gdoor/config.toml`
/// is used when present.
fn load_config() -> Result<Config> {
    match std::env::var("GD_CONFIG") {
        Ok(path) if !path.is_empty() => {
            Config::load_from(&path).with_context(|| format!("failed to load config from {path}"))
        }
        _ => Config::load().context("failed to load config"),
    }
}
