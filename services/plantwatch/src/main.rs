//! Plantwatch CLI
//!
//! Command-line interface for the weather and plant sensor dashboard.

use std::path::PathBuf;

use clap::Parser;
use plantwatch::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "plantwatch")]
#[command(about = "Weather and plant sensor dashboard")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dashboard port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, port={:?}, log_level={:?}",
        args.config,
        args.port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.resolve_secrets()?;

    if let Some(port) = args.port {
        config.dashboard.port = port;
    }

    tracing::info!("Starting plantwatch service");
    tracing::debug!(
        "Query: '{}', poll interval: {}s, data file: {:?}",
        config.poller.resolved_query(),
        config.poller.poll_interval_seconds,
        config.iot.data_file
    );

    plantwatch::run(config).await?;

    Ok(())
}
