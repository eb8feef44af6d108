//! Classifier, model pipeline, artifact persistence and the scoring service

pub mod forest;
pub mod inference;
pub mod loader;
pub mod pipeline;
pub mod tree;

pub use forest::{ForestConfig, RandomForestClassifier};
pub use inference::{ScoringError, ScoringService};
pub use loader::ModelArtifact;
pub use pipeline::ModelPipeline;

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A fitted binary classifier seen only through its probability output.
pub trait ProbabilisticClassifier {
    /// P(positive class) for each row of an already preprocessed matrix.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Expected matrix width.
    fn n_features(&self) -> usize;
}
