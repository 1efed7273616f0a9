mod commands;

use clap::{Parser, Subcommand};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// gdoor CLI -- inspect and command garage-door devices through the bridge.
#[derive(Parser, Debug)]
#[command(name = "gd", version, about)]
struct Cli {
    /// Base URL of the bridge daemon.
    #[arg(long, global = true, env = "GD_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show bridge status (default when no subcommand is given).
    Status,

    /// Show the stored record for one device.
    Device {
        /// 28-character device id.
        id: String,
    },

    /// Send a command to a device.
    Command {
        /// 28-character device id.
        id: String,
        /// actuate-door, health-check, force-health-check or force-door-status-check.
        command: String,
        /// Target address; defaults to the device's last reported address.
        #[arg(long)]
        address: Option<String>,
        /// Target port; defaults to the daemon's configured device port.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Post a status report as if sent by a device.
    Report {
        /// 28-character device id.
        id: String,
        /// Door status code, 0-100.
        status: String,
        /// Value for the X-Forwarded-For header.
        #[arg(long)]
        forwarded_for: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let api_url = cli.api_url.trim_end_matches('/');

    match cli.command {
        None | Some(Commands::Status) => commands::status::run(api_url).await?,
        Some(Commands::Device { id }) => commands::device::run(api_url, &id).await?,
        Some(Commands::Command {
            id,
            command,
            address,
            port,
        }) => commands::command::run(api_url, &id, &command, address, port).await?,
        Some(Commands::Report {
            id,
            status,
            forwarded_for,
        }) => commands::report::run(api_url, &id, &status, forwarded_for.as_deref()).await?,
    }

    Ok(())
}
