//! Parquet / CSV loading into [`RecordSet`]s

use crate::error::{CreditScoringError, Result};
use crate::types::record::{Record, RecordSet, Value};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Loads application tables from disk
pub struct DataLoader {
    /// Rows used by the CSV reader to infer column types
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: 10_000,
        }
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows.max(1);
        self
    }

    /// Load a Parquet file into a record set.
    pub fn load_parquet<P: AsRef<Path>>(&self, path: P) -> Result<RecordSet> {
        let path = path.as_ref();
        ensure_exists(path)?;

        let start = Instant::now();
        let file = File::open(path)?;
        let df = ParquetReader::new(file).finish()?;
        let records = dataframe_to_records(&df)?;

        info!(
            path = %path.display(),
            rows = records.len(),
            columns = records.columns().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Parquet file loaded"
        );
        Ok(records)
    }

    /// Convert a CSV file to Parquet, returning the number of rows written.
    pub fn csv_to_parquet<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> Result<usize> {
        let (input, output) = (input.as_ref(), output.as_ref());
        ensure_exists(input)?;

        let file = File::open(input)?;
        let mut df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .into_reader_with_file_handle(file)
            .finish()?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let out = File::create(output)?;
        ParquetWriter::new(out).finish(&mut df)?;

        info!(
            input = %input.display(),
            output = %output.display(),
            rows = df.height(),
            "Converted CSV to Parquet"
        );
        Ok(df.height())
    }
}

/// Missing input is reported before any work is attempted.
fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CreditScoringError::Configuration(format!(
            "input file {} not found",
            path.display()
        )))
    }
}

/// Numeric and boolean columns become numbers (NaN counts as missing), string
/// columns become text, anything else is rendered as text.
///
/// Every record shares one `Arc<str>` per column name, and cell values are
/// moved out of the per-column buffers rather than cloned.
pub fn dataframe_to_records(df: &DataFrame) -> Result<RecordSet> {
    let height = df.height();
    let mut names: Vec<Arc<str>> = Vec::with_capacity(df.width());
    let mut columns = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        names.push(Arc::from(series.name().as_str()));
        columns.push(series_values(series)?.into_iter());
    }

    let mut records = Vec::with_capacity(height);
    for _ in 0..height {
        let record: Record = names
            .iter()
            .zip(columns.iter_mut())
            .map(|(name, values)| (Arc::clone(name), values.next().unwrap_or_default()))
            .collect();
        records.push(record);
    }

    let schema = names.iter().map(|n| n.to_string()).collect();
    Ok(RecordSet::from_parts(schema, records))
}

fn series_values(series: &Series) -> Result<Vec<Value>> {
    let values = match series.dtype() {
        DataType::Boolean
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::Float32
        | DataType::Float64 => {
            let cast = series.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| match v {
                    Some(x) if !x.is_nan() => Value::Number(x),
                    _ => Value::Missing,
                })
                .collect()
        }
        _ => {
            let cast = series.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(Value::from).unwrap_or(Value::Missing))
                .collect()
        }
    };
    Ok(values)
}
