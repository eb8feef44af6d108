//! Fitted preprocessing pipeline: numeric block then categorical block

use super::{CategoricalColumn, ColumnPartition, NumericColumn, PreprocessingError};
use crate::types::record::{field, Record, RecordSet};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Preprocessing parameters learned from the training split.
///
/// Immutable once built: `fit` returns a new value and `transform` only
/// borrows it. Output columns are the numeric columns in partition order
/// followed by the one-hot blocks of the categorical columns in partition
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    partition: ColumnPartition,
    numeric: Vec<NumericColumn>,
    categorical: Vec<CategoricalColumn>,
}

impl FittedPreprocessor {
    /// Learn imputation, scaling and vocabulary from `train`.
    pub fn fit(partition: ColumnPartition, train: &RecordSet) -> Result<Self, PreprocessingError> {
        if train.is_empty() {
            return Err(PreprocessingError::EmptyTrainingSet);
        }

        let numeric = partition
            .numeric
            .iter()
            .map(|name| NumericColumn::fit(name, train.column_values(name)))
            .collect::<Result<Vec<_>, _>>()?;

        let categorical: Vec<CategoricalColumn> = partition
            .categorical
            .iter()
            .map(|name| CategoricalColumn::fit(name, train.column_values(name)))
            .collect();

        let fitted = Self {
            partition,
            numeric,
            categorical,
        };

        debug!(
            numeric_columns = fitted.numeric.len(),
            categorical_columns = fitted.categorical.len(),
            n_features = fitted.n_features(),
            "Preprocessor fitted"
        );

        Ok(fitted)
    }

    /// The column partition frozen at fit time.
    pub fn partition(&self) -> &ColumnPartition {
        &self.partition
    }

    /// Width of the output feature matrix.
    pub fn n_features(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|c| c.width()).sum::<usize>()
    }

    /// Output feature names, aligned with the matrix columns.
    pub fn feature_names(&self) -> Vec<String> {
        self.numeric
            .iter()
            .map(|c| c.name.clone())
            .chain(self.categorical.iter().flat_map(|c| c.feature_names()))
            .collect()
    }

    /// Transform one record into a feature vector.
    ///
    /// Every partitioned column must be present as a field (a missing value is
    /// fine, an absent field is not). Extra fields are ignored.
    pub fn transform_record(&self, record: &Record) -> Result<Vec<f64>, PreprocessingError> {
        self.check_columns(|name| record.contains_key(name))?;
        self.encode(record)
    }

    /// Transform a record set into an `n_records × n_features` matrix.
    pub fn transform(&self, records: &RecordSet) -> Result<Array2<f64>, PreprocessingError> {
        self.check_columns(|name| records.has_column(name))?;

        let width = self.n_features();
        let mut flat = Vec::with_capacity(records.len() * width);
        for record in records.records() {
            flat.extend(self.encode(record)?);
        }

        Array2::from_shape_vec((records.len(), width), flat)
            .map_err(|e| PreprocessingError::Shape(e.to_string()))
    }

    fn check_columns<F>(&self, present: F) -> Result<(), PreprocessingError>
    where
        F: Fn(&str) -> bool,
    {
        let missing: Vec<String> = self
            .partition
            .columns()
            .filter(|name| !present(name.as_str()))
            .cloned()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PreprocessingError::MissingColumns(missing))
        }
    }

    fn encode(&self, record: &Record) -> Result<Vec<f64>, PreprocessingError> {
        let mut row = Vec::with_capacity(self.n_features());
        for column in &self.numeric {
            row.push(column.transform(field(record, &column.name))?);
        }
        for column in &self.categorical {
            column.encode_into(field(record, &column.name), &mut row);
        }
        Ok(row)
    }
}
