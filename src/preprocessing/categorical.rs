//! Mode imputation followed by one-hot encoding

use crate::types::record::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fitted vocabulary for one categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    /// Most frequent training label; ties go to the smallest label
    pub mode: Option<String>,
    /// Sorted training labels, one output feature each
    pub categories: Vec<String>,
}

impl CategoricalColumn {
    pub fn fit<'a, I>(name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for value in values.into_iter().filter(|v| !v.is_missing()) {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }

        let mode = counts
            .iter()
            .max_by(|(a_label, a_count), (b_label, b_count)| {
                a_count.cmp(b_count).then_with(|| b_label.cmp(a_label))
            })
            .map(|(label, _)| label.clone());

        let mut categories: Vec<String> = counts.into_keys().collect();
        categories.sort();

        Self {
            name: name.to_string(),
            mode,
            categories,
        }
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Output feature names, `COLUMN_category`.
    pub fn feature_names(&self) -> impl Iterator<Item = String> + '_ {
        self.categories
            .iter()
            .map(move |c| format!("{}_{}", self.name, c))
    }

    /// Append the one-hot block for `value` to `out`. Labels not seen during
    /// fit produce an all-zero block.
    pub fn encode_into(&self, value: &Value, out: &mut Vec<f64>) {
        let label = match value {
            Value::Missing => self.mode.clone(),
            other => Some(other.to_string()),
        };
        let hot = label.and_then(|l| self.categories.binary_search(&l).ok());

        out.extend((0..self.categories.len()).map(|i| if Some(i) == hot { 1.0 } else { 0.0 }));
    }
}
