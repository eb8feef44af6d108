//! Training orchestration
//!
//! A run is a straight line with no retries: any failing step aborts it and
//! nothing is written unless every step before persistence succeeded.

use super::evaluation::EvaluationReport;
use crate::config::TrainingConfig;
use crate::data::{stratified_split, DataLoader};
use crate::error::{CreditScoringError, Result};
use crate::feature_enricher::FeatureEnricher;
use crate::models::loader::ModelArtifact;
use crate::models::pipeline::ModelPipeline;
use crate::preprocessing::ColumnPartition;
use crate::types::record::{RecordSet, Value};
use ndarray::Array1;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Summary of a completed training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model_id: Uuid,
    pub model_path: PathBuf,
    pub evaluation: EvaluationReport,
    pub n_numeric: usize,
    pub n_categorical: usize,
    pub n_features: usize,
}

/// Run the full pipeline on the configured Parquet input.
pub fn train(config: &TrainingConfig, threshold: f64) -> Result<TrainingOutcome> {
    let input = Path::new(&config.input_path);
    if !input.exists() {
        return Err(CreditScoringError::Configuration(format!(
            "training input {} not found",
            input.display()
        )));
    }

    let records = DataLoader::new().load_parquet(input)?;
    train_on_records(config, records, threshold)
}

/// Run the pipeline on records that are already in memory.
///
/// The records are consumed: enrichment, target removal and the split all
/// reuse the same rows instead of copying them.
pub fn train_on_records(
    config: &TrainingConfig,
    records: RecordSet,
    threshold: f64,
) -> Result<TrainingOutcome> {
    let start = Instant::now();
    let target = config.target_column.as_str();

    if !records.has_column(target) {
        return Err(CreditScoringError::Data(format!(
            "target column {} not found",
            target
        )));
    }

    let mut features = FeatureEnricher::new().enrich_owned(records)?;
    let labels = extract_labels(&features, target)?;
    features.remove_column(target);
    info!(rows = features.len(), columns = features.columns().len(), "Features enriched");

    let split = stratified_split(&labels, config.test_size, config.random_state)?;
    let (train_set, test_set) = features.into_split(&split.train, &split.test);
    let y_train: Array1<f64> = split.train.iter().map(|&i| labels[i]).collect();
    let y_test: Vec<f64> = split.test.iter().map(|&i| labels[i]).collect();
    info!(train = split.train.len(), test = split.test.len(), "Stratified split done");

    let partition = ColumnPartition::infer(&train_set, target);
    let (n_numeric, n_categorical) = (partition.numeric.len(), partition.categorical.len());
    info!(numeric = n_numeric, categorical = n_categorical, "Column partition inferred");

    let pipeline = ModelPipeline::fit(
        partition,
        &train_set,
        &y_train,
        config.forest.clone(),
        config.random_state,
    )?;
    let n_features = pipeline.preprocessor().n_features();
    drop(train_set);

    let probabilities = pipeline.predict_proba(&test_set)?.to_vec();
    drop(test_set);
    let evaluation = EvaluationReport::evaluate(
        &y_test,
        &probabilities,
        threshold,
        split.train.len(),
    );
    info!(roc_auc = ?evaluation.roc_auc, "Hold-out evaluation\n{}", evaluation.classification);

    let artifact = ModelArtifact::new(pipeline, target, threshold, Some(evaluation.clone()));
    let model_path = PathBuf::from(&config.model_output_path);
    artifact.save(&model_path)?;

    info!(
        model_id = %artifact.model_id,
        elapsed_secs = start.elapsed().as_secs_f64(),
        "Training complete"
    );

    Ok(TrainingOutcome {
        model_id: artifact.model_id,
        model_path,
        evaluation,
        n_numeric,
        n_categorical,
        n_features,
    })
}

/// The target must be 0 or 1 on every row.
fn extract_labels(records: &RecordSet, target: &str) -> Result<Vec<f64>> {
    records
        .column_values(target)
        .enumerate()
        .map(|(row, value)| match value {
            Value::Number(v) if *v == 0.0 || *v == 1.0 => Ok(*v),
            other => Err(CreditScoringError::Data(format!(
                "{} at row {} must be 0 or 1, got {:?}",
                target, row, other
            ))),
        })
        .collect()
}
