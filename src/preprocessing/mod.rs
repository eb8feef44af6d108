//! Preprocessing learned from the training split and frozen for serving
//!
//! - [`ColumnPartition`] splits the enriched columns into numeric and
//!   categorical buckets, once, on training data.
//! - [`FittedPreprocessor`] owns the imputation statistics, scaling
//!   parameters and one-hot vocabularies, and turns records into a dense
//!   feature matrix with a stable column order.

mod categorical;
mod numeric;
mod partition;
mod pipeline;

pub use categorical::CategoricalColumn;
pub use numeric::NumericColumn;
pub use partition::{ColumnPartition, ColumnType};
pub use pipeline::FittedPreprocessor;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreprocessingError {
    #[error("cannot fit preprocessing on an empty record set")]
    EmptyTrainingSet,

    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("column {column} expects a number, got {value:?}")]
    NotNumeric { column: String, value: String },

    #[error("feature matrix has shape mismatch: {0}")]
    Shape(String),
}
