//! Credit Scoring - Main Entry Point
//!
//! `train` fits and persists the model, `serve` exposes it over HTTP,
//! `convert` turns the raw CSV export into Parquet.

use anyhow::{Context, Result};
use clap::Parser;
use credit_scoring_pipeline::{
    cli::{apply_overrides, cmd_convert, cmd_serve, cmd_train, Cli, Commands},
    config::{AppConfig, LoggingConfig},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if logging.format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.pretty().try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from_path(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    apply_overrides(&mut config, &cli.command);

    init_tracing(&config.logging)?;
    info!(config = %cli.config.display(), "Configuration loaded");

    match &cli.command {
        Commands::Train { .. } => {
            // CPU-bound; keep it off the async workers
            let config = config.clone();
            tokio::task::spawn_blocking(move || cmd_train(&config))
                .await
                .context("Training task panicked")??;
        }
        Commands::Serve { .. } => cmd_serve(&config).await?,
        Commands::Convert { input, output } => cmd_convert(input, output)?,
    }

    Ok(())
}
