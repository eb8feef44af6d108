//! Command-line interface: train, serve, convert

use crate::config::{AppConfig, DEFAULT_CONFIG_PATH};
use crate::data::DataLoader;
use crate::server;
use crate::training;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "credit-scoring")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Credit default scoring: training pipeline and HTTP API", long_about = None)]
pub struct Cli {
    /// Configuration file (optional; defaults and env vars still apply)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the scoring model and write the artifact
    Train {
        /// Parquet training file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output model artifact
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start the scoring API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        /// Model artifact to load at startup
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Convert a raw CSV export to Parquet
    Convert {
        /// CSV input file
        #[arg(short, long)]
        input: PathBuf,

        /// Parquet output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_overrides(config: &mut AppConfig, command: &Commands) {
    match command {
        Commands::Train { input, output } => {
            if let Some(input) = input {
                config.training.input_path = input.display().to_string();
            }
            if let Some(output) = output {
                config.training.model_output_path = output.display().to_string();
            }
        }
        Commands::Serve { host, port, model } => {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(model) = model {
                config.server.model_path = model.display().to_string();
            }
        }
        Commands::Convert { .. } => {}
    }
}

pub fn cmd_train(config: &AppConfig) -> Result<()> {
    let outcome = training::train(&config.training, config.scoring.threshold)
        .context("Training failed")?;

    println!("{}", outcome.evaluation);
    info!(
        model_id = %outcome.model_id,
        path = %outcome.model_path.display(),
        features = outcome.n_features,
        "Model saved"
    );
    Ok(())
}

pub async fn cmd_serve(config: &AppConfig) -> Result<()> {
    server::run_server(config.server.clone(), config.scoring.clone()).await
}

pub fn cmd_convert(input: &Path, output: &Path) -> Result<()> {
    let rows = DataLoader::new()
        .csv_to_parquet(input, output)
        .with_context(|| format!("Failed to convert {}", input.display()))?;
    println!("Wrote {} rows to {}", rows, output.display());
    Ok(())
}
