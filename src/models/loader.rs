//! Model artifact persistence
//!
//! The whole [`ModelPipeline`] (preprocessing statistics, vocabularies and
//! forest) is written as a single JSON document so the two stages can only be
//! loaded together.

use super::pipeline::ModelPipeline;
use crate::error::{CreditScoringError, Result};
use crate::training::evaluation::EvaluationReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Bumped whenever the serialized layout changes incompatibly.
pub const ARTIFACT_FORMAT_VERSION: u32 = 2;

/// Persisted model: pipeline plus provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Label column the model was trained on
    pub target_column: String,
    /// Decision threshold in force when the model was trained and evaluated
    pub threshold: f64,
    /// Hold-out evaluation recorded at training time
    pub evaluation: Option<EvaluationReport>,
    pub pipeline: ModelPipeline,
}

impl ModelArtifact {
    pub fn new(
        pipeline: ModelPipeline,
        target_column: &str,
        threshold: f64,
        evaluation: Option<EvaluationReport>,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_id: Uuid::new_v4(),
            created_at: Utc::now(),
            target_column: target_column.to_string(),
            threshold,
            evaluation,
            pipeline,
        }
    }

    /// Write the artifact, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;

        info!(
            model_id = %self.model_id,
            path = %path.display(),
            "Model artifact saved"
        );
        Ok(())
    }

    /// Read an artifact. A missing file is a configuration error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CreditScoringError::Configuration(format!(
                "model artifact {} not found",
                path.display()
            )));
        }

        info!(path = %path.display(), "Loading model artifact");
        let reader = BufReader::new(File::open(path)?);
        let artifact: ModelArtifact = serde_json::from_reader(reader)?;

        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(CreditScoringError::Serialization(format!(
                "unsupported artifact format {} (expected {})",
                artifact.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }

        info!(
            model_id = %artifact.model_id,
            created_at = %artifact.created_at.to_rfc3339(),
            n_features = artifact.pipeline.preprocessor().n_features(),
            "Model artifact loaded"
        );
        Ok(artifact)
    }
}
