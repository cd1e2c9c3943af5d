//! Devicepulse CLI
//!
//! Fleet liveness and upload-latency telemetry service.

use anyhow::Context;
use clap::{Parser, Subcommand};
use devicepulse::{
    config::Config,
    loader::load_devices,
    server::{run, ServerConfig},
    store::DeviceStore,
    validate::TimestampPolicy,
    VERSION,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "devicepulse")]
#[command(version = VERSION)]
#[command(about = "Fleet liveness and upload-latency telemetry service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the telemetry server
    Serve {
        /// Port to bind to (0 for random)
        #[arg(long)]
        port: Option<u16>,

        /// Interface to bind to
        #[arg(long)]
        host: Option<String>,

        /// Device roster CSV (first column: device id)
        #[arg(long)]
        devices: Option<PathBuf>,

        /// Accept timestamps regardless of age or clock skew
        #[arg(long)]
        no_timestamp_policy: bool,
    },

    /// Validate a device roster CSV without starting the server
    Check {
        /// Device roster CSV to validate
        #[arg(long)]
        devices: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            port,
            host,
            devices,
            no_timestamp_policy,
        } => cmd_serve(port, host, devices, no_timestamp_policy).await,
        Commands::Check { devices } => cmd_check(devices),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devicepulse=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn cmd_serve(
    port: Option<u16>,
    host: Option<String>,
    devices: Option<PathBuf>,
    no_timestamp_policy: bool,
) -> anyhow::Result<()> {
    let mut config = Config::from_env();
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(devices) = devices {
        config.devices_path = devices;
    }
    if no_timestamp_policy {
        config.timestamp_policy = false;
    }

    let store = Arc::new(DeviceStore::new());
    load_devices(&config.devices_path, &store).context("device roster bootstrap failed")?;

    let policy = if config.timestamp_policy {
        TimestampPolicy::default()
    } else {
        tracing::warn!("timestamp sanity policy disabled");
        TimestampPolicy::disabled()
    };

    let server_config = ServerConfig::new(config.host.clone(), config.port, policy);
    let (_addr, shutdown_tx) = run(server_config, store).await?;

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("shutting down");
    let _ = shutdown_tx.send(());

    Ok(())
}

fn cmd_check(devices: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = Config::from_env();
    if let Some(devices) = devices {
        config.devices_path = devices;
    }

    let store = DeviceStore::new();
    let summary = load_devices(&config.devices_path, &store)?;

    println!("Roster {}:", config.devices_path.display());
    println!("  devices:    {}", summary.created);
    println!("  duplicates: {}", summary.duplicates);
    println!("  skipped:    {}", summary.skipped);

    Ok(())
}
