//! Wine API server binary

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use wine_api::{start_server, AppState, ModelState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "wine-api")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HTTP prediction service for the Wine classifier", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Path of the model artifact
    #[arg(long)]
    model: Option<PathBuf>,

    /// Start even when the model artifact is missing
    #[arg(long)]
    allow_missing_model: bool,
}

impl Cli {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        if self.allow_missing_model {
            config.require_model = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let mut config = ServerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);

    info!("Starting Wine API v{}", env!("CARGO_PKG_VERSION"));

    if let Err(err) = config.check_model_present() {
        error!("{}", err);
        eprintln!("ERROR: {err}");
        eprintln!("Run `train` first to create it, or pass --allow-missing-model");
        std::process::exit(1);
    }

    let model = ModelState::load(&config.model_path);
    start_server(AppState::new(config, model)).await
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
