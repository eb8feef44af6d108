//! Credit Scoring Pipeline Library
//!
//! Trains a default-probability model on loan applications and serves it over
//! HTTP. Training and serving share one enrichment step and one persisted
//! preprocessing + forest pipeline, so both sides transform inputs the same
//! way.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod feature_enricher;
pub mod metrics;
pub mod models;
pub mod preprocessing;
pub mod server;
pub mod training;
pub mod types;

pub use config::AppConfig;
pub use error::{CreditScoringError, Result};
pub use feature_enricher::FeatureEnricher;
pub use models::{ModelArtifact, ModelPipeline, ScoringError, ScoringService};
pub use preprocessing::{ColumnPartition, FittedPreprocessor};
pub use types::{Decision, Record, RecordSet, ScoringResult, Value};
