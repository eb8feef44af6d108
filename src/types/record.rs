//! Tabular record model shared by the training and serving paths

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A single scalar cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// Null / NaN / absent
    #[default]
    Missing,
    Number(f64),
    Text(String),
}

impl Value {
    /// Convert a JSON scalar into a cell.
    ///
    /// Booleans become `1.0` / `0.0`. Arrays and objects are not scalars and
    /// return `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Value::Missing),
            serde_json::Value::Bool(b) => Some(Value::Number(if *b { 1.0 } else { 0.0 })),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number),
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the cell. Text is never parsed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Kind of the cell, `None` for missing.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Missing => None,
            Value::Number(_) => Some(ValueKind::Number),
            Value::Text(_) => Some(ValueKind::Text),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map(Value::Number).unwrap_or(Value::Missing)
    }
}

/// Renders the cell as a category label. Integral numbers print without a
/// fractional part so `1.0` and `1` land on the same category.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{:.0}", v),
            Value::Number(v) => write!(f, "{}", v),
        }
    }
}

/// Storage kind of a non-missing cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Text,
}

/// One application: field name → value.
///
/// Keys are shared `Arc<str>`s so a loaded table stores each column name once
/// rather than once per cell.
pub type Record = BTreeMap<Arc<str>, Value>;

/// Read a field, treating an absent field as missing.
pub fn field<'a>(record: &'a Record, name: &str) -> &'a Value {
    static MISSING: Value = Value::Missing;
    record.get(name).unwrap_or(&MISSING)
}

/// An ordered sequence of records sharing a schema.
///
/// `columns` keeps the schema in source order; records may omit fields, which
/// then read as missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl RecordSet {
    /// Create an empty record set with the given schema.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    /// Build a record set from records, collecting the schema in first-seen
    /// order.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut set = Self::default();
        for record in records {
            set.push(record);
        }
        set
    }

    /// Build a record set from records already laid out on `columns`.
    ///
    /// Fields outside `columns` are kept in the records but not added to the
    /// schema.
    pub fn from_parts(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    /// Append a record, extending the schema with any new field.
    pub fn push(&mut self, record: Record) {
        for name in record.keys() {
            self.ensure_column(name);
        }
        self.records.push(record);
    }

    /// Add a column name to the schema if it is not there yet.
    pub fn ensure_column(&mut self, name: &str) {
        if !self.columns.iter().any(|c| c == name) {
            self.columns.push(name.to_string());
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Values of one column, missing where a record lacks the field.
    pub fn column_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.records.iter().map(move |r| field(r, name))
    }

    /// Mutable access to the records. The schema is not updated; call
    /// [`RecordSet::ensure_column`] for any field added through it.
    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    /// Move the rows at `first` and at `second` into two new sets sharing this
    /// schema. Out-of-range and repeated indices are skipped.
    pub fn into_split(self, first: &[usize], second: &[usize]) -> (RecordSet, RecordSet) {
        let mut slots: Vec<Option<Record>> = self.records.into_iter().map(Some).collect();
        let mut take = |indices: &[usize]| -> Vec<Record> {
            indices
                .iter()
                .filter_map(|&i| slots.get_mut(i).and_then(Option::take))
                .collect()
        };
        let first = take(first);
        let second = take(second);

        (
            RecordSet::from_parts(self.columns.clone(), first),
            RecordSet::from_parts(self.columns, second),
        )
    }

    /// Drop `name` from the schema and from every record, in place.
    pub fn remove_column(&mut self, name: &str) {
        self.columns.retain(|c| c != name);
        for record in &mut self.records {
            record.remove(name);
        }
    }
}
