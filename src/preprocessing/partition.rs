//! Numeric / categorical column classification

use crate::types::record::{RecordSet, ValueKind};
use serde::{Deserialize, Serialize};

/// Column data type for preprocessing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
}

/// Disjoint, ordered numeric and categorical column lists.
///
/// Computed once from the training split. The fitted preprocessor keeps its
/// own copy and never re-infers types at inference time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPartition {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl ColumnPartition {
    /// Classify every column of `records` except `target`, keeping schema
    /// order inside each bucket.
    ///
    /// Rules:
    /// - only numbers (ignoring missing) → numeric
    /// - any text → categorical, numbers in a mixed column become labels
    /// - only missing → numeric
    pub fn infer(records: &RecordSet, target: &str) -> Self {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();

        for name in records.columns().iter().filter(|c| c.as_str() != target) {
            match Self::classify(records, name) {
                ColumnType::Numeric => numeric.push(name.clone()),
                ColumnType::Categorical => categorical.push(name.clone()),
            }
        }

        Self {
            numeric,
            categorical,
        }
    }

    fn classify(records: &RecordSet, name: &str) -> ColumnType {
        let has_text = records
            .column_values(name)
            .any(|v| v.kind() == Some(ValueKind::Text));
        if has_text {
            ColumnType::Categorical
        } else {
            ColumnType::Numeric
        }
    }

    /// Type assigned to `name`, if it is part of the partition.
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        if self.numeric.iter().any(|c| c == name) {
            Some(ColumnType::Numeric)
        } else if self.categorical.iter().any(|c| c == name) {
            Some(ColumnType::Categorical)
        } else {
            None
        }
    }

    /// All partitioned columns, numeric block first.
    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.numeric.iter().chain(self.categorical.iter())
    }

    pub fn len(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::{Record, Value};

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (std::sync::Arc::from(*k), v.clone()))
            .collect()
    }

    #[test]
    fn test_partition_rules() {
        let set = RecordSet::from_records(vec![
            record(&[
                ("AMT_CREDIT", 1.0.into()),
                ("CODE_GENDER", "F".into()),
                ("MIXED", 3.0.into()),
                ("EMPTY", Value::Missing),
                ("TARGET", 0.0.into()),
            ]),
            record(&[
                ("AMT_CREDIT", Value::Missing),
                ("CODE_GENDER", Value::Missing),
                ("MIXED", "x".into()),
                ("EMPTY", Value::Missing),
                ("TARGET", 1.0.into()),
            ]),
        ]);

        let partition = ColumnPartition::infer(&set, "TARGET");

        assert_eq!(partition.numeric, vec!["AMT_CREDIT", "EMPTY"]);
        assert_eq!(partition.categorical, vec!["CODE_GENDER", "MIXED"]);
        assert_eq!(partition.column_type("TARGET"), None);
        assert_eq!(partition.column_type("MIXED"), Some(ColumnType::Categorical));
        assert_eq!(partition.len(), 4);
    }

    #[test]
    fn test_partition_is_deterministic() {
        let set = RecordSet::from_records(vec![record(&[
            ("B", 1.0.into()),
            ("A", "k".into()),
            ("C", 2.0.into()),
        ])]);

        let first = ColumnPartition::infer(&set, "TARGET");
        let second = ColumnPartition::infer(&set, "TARGET");

        assert_eq!(first, second);
        let ordered: Vec<&String> = first.columns().collect();
        assert_eq!(ordered, vec!["B", "C", "A"]);
    }
}
