//! Scoring service: enrich → pipeline → threshold rule

use super::loader::ModelArtifact;
use super::pipeline::ModelPipeline;
use crate::error::{CreditScoringError, Result};
use crate::feature_enricher::FeatureEnricher;
use crate::types::record::{Record, Value};
use crate::types::scoring::ScoringResult;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Per-request scoring failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// No model loaded yet; the caller may retry later
    #[error("the model is not loaded")]
    ServiceUnavailable,

    /// The request features could not be enriched or scored
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// A pipeline that finished loading, with its provenance
#[derive(Debug)]
pub struct LoadedModel {
    pub model_id: Uuid,
    pub pipeline: ModelPipeline,
}

/// Scores applications against a model loaded once at startup.
///
/// Starts `Unloaded`. [`ScoringService::load`] moves it to `Ready` exactly
/// once; there is no way back. Calls made while unloaded fail fast with
/// [`ScoringError::ServiceUnavailable`]. Once ready, the pipeline is shared
/// read-only between concurrent calls.
pub struct ScoringService {
    model: OnceLock<Arc<LoadedModel>>,
    enricher: FeatureEnricher,
    threshold: f64,
}

impl ScoringService {
    /// Create an unloaded service with the given decision threshold.
    pub fn new(threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(CreditScoringError::Configuration(format!(
                "threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        Ok(Self {
            model: OnceLock::new(),
            enricher: FeatureEnricher::new(),
            threshold,
        })
    }

    /// Create a service that is already ready.
    pub fn with_pipeline(pipeline: ModelPipeline, model_id: Uuid, threshold: f64) -> Result<Self> {
        let service = Self::new(threshold)?;
        service.install(LoadedModel { model_id, pipeline })?;
        Ok(service)
    }

    /// Deserialize the artifact at `path` and transition to `Ready`.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let artifact = ModelArtifact::load(path)?;
        self.install(LoadedModel {
            model_id: artifact.model_id,
            pipeline: artifact.pipeline,
        })
    }

    fn install(&self, model: LoadedModel) -> Result<()> {
        let model_id = model.model_id;
        self.model.set(Arc::new(model)).map_err(|_| {
            CreditScoringError::Configuration("a model is already loaded".to_string())
        })?;
        info!(model_id = %model_id, threshold = self.threshold, "Scoring service ready");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.model.get().is_some()
    }

    pub fn model_id(&self) -> Option<Uuid> {
        self.model.get().map(|m| m.model_id)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score one application given as JSON scalars.
    pub fn score_features(
        &self,
        features: &HashMap<String, serde_json::Value>,
    ) -> std::result::Result<ScoringResult, ScoringError> {
        // availability first: an unloaded service never looks at the input
        let model = self.ready()?;
        let record = features_to_record(features)?;
        self.score_with(model, &record)
    }

    /// Score one raw (not yet enriched) record.
    pub fn score(&self, raw: &Record) -> std::result::Result<ScoringResult, ScoringError> {
        let model = self.ready()?;
        self.score_with(model, raw)
    }

    fn ready(&self) -> std::result::Result<&LoadedModel, ScoringError> {
        self.model
            .get()
            .map(|m| m.as_ref())
            .ok_or(ScoringError::ServiceUnavailable)
    }

    fn score_with(
        &self,
        model: &LoadedModel,
        raw: &Record,
    ) -> std::result::Result<ScoringResult, ScoringError> {
        let enriched = self
            .enricher
            .enrich_record(raw)
            .map_err(|e| ScoringError::InvalidInput(e.to_string()))?;

        let probability = model
            .pipeline
            .predict_proba_record(&enriched)
            .map_err(|e| ScoringError::InvalidInput(e.to_string()))?;

        let result = ScoringResult::new(probability, self.threshold);
        debug!(
            model_id = %model.model_id,
            probability = result.probability,
            decision = result.decision.as_str(),
            "Application scored"
        );
        Ok(result)
    }
}

/// Convert request features to a record; nested values are rejected.
pub fn features_to_record(
    features: &HashMap<String, serde_json::Value>,
) -> std::result::Result<Record, ScoringError> {
    features
        .iter()
        .map(|(name, value)| {
            Value::from_json(value)
                .map(|v| (Arc::from(name.as_str()), v))
                .ok_or_else(|| {
                    ScoringError::InvalidInput(format!("field {} must be a scalar", name))
                })
        })
        .collect()
}
