//! Tractor telemetry client - Entry Point

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tractor_client::app::format_status;
use tractor_client::{AppConfig, Application};
use tractor_telemetry::Metrics;

/// Live telemetry and remote control for the tractor dashboard backend
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TRACTOR_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Backend base URL, overrides the configuration file
    #[arg(short, long)]
    backend: Option<String>,

    /// Print Prometheus metrics on exit
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
enum Command {
    /// Follow live telemetry with an interactive control console
    #[default]
    Watch,
    /// Print backend status
    Status,
    /// Download the CSV export
    Export,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any wss:// connection)
    tractor_ws::init_crypto();

    let args = Args::parse();

    tractor_telemetry::init_logging()?;

    info!("Starting tractor-client v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(args.config)?;
    if let Some(backend) = args.backend {
        config = config.with_backend(backend);
    }
    info!(backend = %config.backend_url, "Configuration loaded");

    let app = Application::new(config)?;

    match args.command.unwrap_or_default() {
        Command::Watch => app.watch().await?,
        Command::Status => {
            let status = app.status().await?;
            println!("backend: {}", app.config().backend_url);
            println!("{}", format_status(&status));
        }
        Command::Export => {
            let path = app.export().await?;
            println!("{}", path.display());
        }
    }

    if args.metrics {
        print!("{}", Metrics::render()?);
    }

    Ok(())
}
