//! Configuration management for the credit scoring pipeline
//!
//! Values are layered: built-in defaults, then `config/config.toml` (or the
//! path given on the command line) when it exists, then environment variables
//! prefixed with `CREDIT_SCORING__` (e.g. `CREDIT_SCORING__SERVER__PORT=9000`).

use crate::models::forest::ForestConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const ENV_PREFIX: &str = "CREDIT_SCORING";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub training: TrainingConfig,
    pub server: ServerConfig,
    pub scoring: ScoringConfig,
    pub logging: LoggingConfig,
}

/// Offline training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Parquet file holding the labelled applications
    pub input_path: String,
    /// Where the trained model artifact is written
    pub model_output_path: String,
    /// Binary label column (1 = defaulted)
    pub target_column: String,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the split and the forest
    pub random_state: u64,
    #[serde(default)]
    pub forest: ForestConfig,
}

/// HTTP scoring service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Model artifact loaded at startup
    pub model_path: String,
    /// Seconds between metrics summaries in the log, 0 disables them
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Probabilities strictly above this are refused
    pub threshold: f64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path. A missing file is not an
    /// error; defaults and environment overrides still apply.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("Failed to serialize default configuration")?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.scoring.threshold) {
            anyhow::bail!(
                "scoring.threshold must be within [0, 1], got {}",
                self.scoring.threshold
            );
        }
        if !(self.training.test_size > 0.0 && self.training.test_size < 1.0) {
            anyhow::bail!(
                "training.test_size must be within (0, 1), got {}",
                self.training.test_size
            );
        }
        if self.training.forest.n_estimators == 0 {
            anyhow::bail!("training.forest.n_estimators must be at least 1");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            training: TrainingConfig {
                input_path: "data/processed/application_train.parquet".to_string(),
                model_output_path: "models/credit_scoring_model.json".to_string(),
                target_column: "TARGET".to_string(),
                test_size: 0.2,
                random_state: 42,
                forest: ForestConfig::default(),
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                model_path: "models/credit_scoring_model.json".to_string(),
                metrics_interval_secs: default_metrics_interval(),
            },
            scoring: ScoringConfig { threshold: 0.5 },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
