//! Preprocessor + classifier packaged as one unit

use super::forest::{ForestConfig, RandomForestClassifier};
use super::ProbabilisticClassifier;
use crate::error::{CreditScoringError, Result};
use crate::preprocessing::{ColumnPartition, FittedPreprocessor};
use crate::types::record::{Record, RecordSet};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// The fitted preprocessor and the classifier trained on its output.
///
/// The classifier is private: the only way to reach it is through
/// [`ModelPipeline::predict_proba`], which always runs the preprocessor it was
/// trained against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPipeline<C = RandomForestClassifier> {
    preprocessor: FittedPreprocessor,
    classifier: C,
}

impl ModelPipeline<RandomForestClassifier> {
    /// Fit preprocessing on `train` (already enriched, target removed), then
    /// fit the forest on the transformed matrix.
    pub fn fit(
        partition: ColumnPartition,
        train: &RecordSet,
        labels: &Array1<f64>,
        forest: ForestConfig,
        random_state: u64,
    ) -> Result<Self> {
        let preprocessor = FittedPreprocessor::fit(partition, train)?;
        let x = preprocessor.transform(train)?;
        let classifier = RandomForestClassifier::fit(forest, random_state, &x, labels)?;
        Self::new(preprocessor, classifier)
    }
}

impl<C: ProbabilisticClassifier> ModelPipeline<C> {
    /// Pair a preprocessor with a classifier fitted on its output width.
    pub fn new(preprocessor: FittedPreprocessor, classifier: C) -> Result<Self> {
        if preprocessor.n_features() != classifier.n_features() {
            return Err(CreditScoringError::Shape {
                expected: format!("{} features", preprocessor.n_features()),
                actual: format!("{} features", classifier.n_features()),
            });
        }
        Ok(Self {
            preprocessor,
            classifier,
        })
    }

    pub fn preprocessor(&self) -> &FittedPreprocessor {
        &self.preprocessor
    }

    /// Default probability for each enriched record.
    pub fn predict_proba(&self, records: &RecordSet) -> Result<Array1<f64>> {
        let x = self.preprocessor.transform(records)?;
        self.classifier.predict_proba(&x)
    }

    /// Default probability for a single enriched record.
    pub fn predict_proba_record(&self, record: &Record) -> Result<f64> {
        let row = self.preprocessor.transform_record(record)?;
        let x = Array2::from_shape_vec((1, row.len()), row).map_err(|e| {
            CreditScoringError::Shape {
                expected: format!("1 x {}", self.preprocessor.n_features()),
                actual: e.to_string(),
            }
        })?;
        let probs = self.classifier.predict_proba(&x)?;
        probs.get(0).copied().ok_or_else(|| {
            CreditScoringError::Training("classifier returned no probability".to_string())
        })
    }
}
