//! Error types for the credit scoring pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, CreditScoringError>;

/// Errors raised while loading data, fitting or persisting the pipeline.
///
/// Serving-side failures use [`crate::models::inference::ScoringError`] instead,
/// since they are reported per request rather than aborting a run.
#[derive(Error, Debug)]
pub enum CreditScoringError {
    /// Bad configuration detected before any work starts (missing input file,
    /// out-of-range threshold, ...).
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Enrichment error: {0}")]
    Enrichment(#[from] crate::feature_enricher::EnrichmentError),

    #[error("Preprocessing error: {0}")]
    Preprocessing(#[from] crate::preprocessing::PreprocessingError),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },
}

impl From<polars::error::PolarsError> for CreditScoringError {
    fn from(err: polars::error::PolarsError) -> Self {
        CreditScoringError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for CreditScoringError {
    fn from(err: serde_json::Error) -> Self {
        CreditScoringError::Serialization(err.to_string())
    }
}
