//! Median imputation followed by standard scaling

use super::PreprocessingError;
use crate::types::record::Value;
use serde::{Deserialize, Serialize};

/// Fitted parameters for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    /// Fill value for missing cells
    pub median: f64,
    /// Mean of the imputed training column
    pub mean: f64,
    /// Population standard deviation of the imputed training column, 1.0 when
    /// the column is constant
    pub scale: f64,
}

impl NumericColumn {
    /// Learn median, mean and scale from the training values of one column.
    ///
    /// Missing and non-finite cells do not contribute to the median; they are
    /// replaced by it before the mean and variance are computed.
    pub fn fit<'a, I>(name: &str, values: I) -> Result<Self, PreprocessingError>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut observed = Vec::new();
        let mut n_missing = 0usize;

        for value in values {
            match numeric_cell(name, value)? {
                Some(v) => observed.push(v),
                None => n_missing += 1,
            }
        }

        let median = median(&mut observed);
        let n = (observed.len() + n_missing) as f64;
        if n == 0.0 {
            return Err(PreprocessingError::EmptyTrainingSet);
        }

        let sum: f64 = observed.iter().sum::<f64>() + median * n_missing as f64;
        let mean = sum / n;
        let sq: f64 = observed.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            + (median - mean).powi(2) * n_missing as f64;
        let std = (sq / n).sqrt();

        Ok(Self {
            name: name.to_string(),
            median,
            mean,
            scale: if std > 0.0 && std.is_finite() { std } else { 1.0 },
        })
    }

    /// Impute then standardize one cell.
    pub fn transform(&self, value: &Value) -> Result<f64, PreprocessingError> {
        let v = numeric_cell(&self.name, value)?.unwrap_or(self.median);
        Ok((v - self.mean) / self.scale)
    }
}

/// `None` for missing or non-finite cells, an error for text.
fn numeric_cell(column: &str, value: &Value) -> Result<Option<f64>, PreprocessingError> {
    match value {
        Value::Missing => Ok(None),
        Value::Number(v) if v.is_finite() => Ok(Some(*v)),
        Value::Number(_) => Ok(None),
        Value::Text(s) => Err(PreprocessingError::NotNumeric {
            column: column.to_string(),
            value: s.clone(),
        }),
    }
}

/// Median of `values` (sorted in place); 0.0 when empty.
fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
