//! Offline training: load, enrich, split, fit, evaluate, persist

pub mod evaluation;
pub mod orchestrator;

pub use evaluation::{roc_auc, ClassificationReport, EvaluationReport};
pub use orchestrator::{train, train_on_records, TrainingOutcome};
