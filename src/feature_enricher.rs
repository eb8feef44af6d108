//! Feature enrichment applied before preprocessing.
//!
//! The exact same function runs in the training path (before column
//! partitioning) and in the serving path (before the fitted pipeline), so the
//! derived columns can never drift between the two.

use crate::types::record::{field, Record, RecordSet, Value};
use std::sync::Arc;
use thiserror::Error;

pub const AMT_CREDIT: &str = "AMT_CREDIT";
pub const AMT_INCOME_TOTAL: &str = "AMT_INCOME_TOTAL";
pub const AMT_ANNUITY: &str = "AMT_ANNUITY";
pub const DAYS_EMPLOYED: &str = "DAYS_EMPLOYED";
pub const CREDIT_INCOME_RATIO: &str = "CREDIT_INCOME_RATIO";
pub const ANNUITY_INCOME_RATIO: &str = "ANNUITY_INCOME_RATIO";

/// Placeholder used in the source data for "not employed".
pub const DAYS_EMPLOYED_SENTINEL: f64 = 365243.0;

/// Fields every record must carry to be enriched
pub const REQUIRED_FIELDS: [&str; 4] = [AMT_CREDIT, AMT_INCOME_TOTAL, AMT_ANNUITY, DAYS_EMPLOYED];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnrichmentError {
    #[error("missing required field {0}")]
    MissingField(String),

    #[error("field {0} must be numeric")]
    NotNumeric(String),
}

/// Adds the income ratios and normalises `DAYS_EMPLOYED`.
///
/// Ratio policy: a missing numerator, a missing or zero income, or a
/// non-finite quotient all yield a missing ratio instead of an error.
#[derive(Debug, Clone)]
pub struct FeatureEnricher {
    // one allocation per derived name, shared by every enriched record
    credit_ratio_key: Arc<str>,
    annuity_ratio_key: Arc<str>,
}

impl FeatureEnricher {
    pub fn new() -> Self {
        Self {
            credit_ratio_key: Arc::from(CREDIT_INCOME_RATIO),
            annuity_ratio_key: Arc::from(ANNUITY_INCOME_RATIO),
        }
    }

    /// Enrich one record, returning a new record. The input is untouched.
    pub fn enrich_record(&self, record: &Record) -> Result<Record, EnrichmentError> {
        let mut enriched = record.clone();
        self.enrich_in_place(&mut enriched)?;
        Ok(enriched)
    }

    /// Enrich one record in place. On error the record is left unchanged.
    pub fn enrich_in_place(&self, record: &mut Record) -> Result<(), EnrichmentError> {
        let credit = required_number(record, AMT_CREDIT)?;
        let income = required_number(record, AMT_INCOME_TOTAL)?;
        let annuity = required_number(record, AMT_ANNUITY)?;
        let days_employed = required_number(record, DAYS_EMPLOYED)?;

        set_field(record, &self.credit_ratio_key, ratio(credit, income).into());
        set_field(record, &self.annuity_ratio_key, ratio(annuity, income).into());

        // exact comparison: the sentinel is a literal code, not a measurement
        let days_employed = days_employed.filter(|&d| d != DAYS_EMPLOYED_SENTINEL);
        if let Some(slot) = record.get_mut(DAYS_EMPLOYED) {
            *slot = days_employed.into();
        }

        Ok(())
    }

    /// Enrich every record of a set into a new set. Fails on the first bad
    /// record.
    pub fn enrich(&self, records: &RecordSet) -> Result<RecordSet, EnrichmentError> {
        self.enrich_owned(records.clone())
    }

    /// Enrich a set that is no longer needed in raw form, reusing its
    /// storage.
    pub fn enrich_owned(&self, mut records: RecordSet) -> Result<RecordSet, EnrichmentError> {
        for name in self.derived_fields() {
            records.ensure_column(name);
        }
        for record in records.records_mut() {
            self.enrich_in_place(record)?;
        }
        Ok(records)
    }

    /// Names of the fields written by enrichment.
    pub fn derived_fields(&self) -> [&'static str; 3] {
        [CREDIT_INCOME_RATIO, ANNUITY_INCOME_RATIO, DAYS_EMPLOYED]
    }
}

impl Default for FeatureEnricher {
    fn default() -> Self {
        Self::new()
    }
}

/// `Ok(None)` for a missing value; an error if the field is absent or text.
fn required_number(record: &Record, name: &str) -> Result<Option<f64>, EnrichmentError> {
    if !record.contains_key(name) {
        return Err(EnrichmentError::MissingField(name.to_string()));
    }
    match field(record, name) {
        Value::Missing => Ok(None),
        Value::Number(v) if v.is_nan() => Ok(None),
        Value::Number(v) => Ok(Some(*v)),
        Value::Text(_) => Err(EnrichmentError::NotNumeric(name.to_string())),
    }
}

/// Overwrite `key` if present, otherwise insert it under the shared name.
fn set_field(record: &mut Record, key: &Arc<str>, value: Value) {
    match record.get_mut(key.as_ref()) {
        Some(slot) => *slot = value,
        None => {
            record.insert(key.clone(), value);
        }
    }
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    Some(n / d).filter(|r| r.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(credit: Value, income: Value, annuity: Value, days: Value) -> Record {
        let mut r = Record::new();
        r.insert(AMT_CREDIT.into(), credit);
        r.insert(AMT_INCOME_TOTAL.into(), income);
        r.insert(AMT_ANNUITY.into(), annuity);
        r.insert(DAYS_EMPLOYED.into(), days);
        r.insert("NAME_CONTRACT_TYPE".into(), Value::from("Cash loans"));
        r
    }

    #[test]
    fn test_reference_record() {
        let enricher = FeatureEnricher::new();
        let record = raw(100000.0.into(), 50000.0.into(), 5000.0.into(), 365243.0.into());

        let enriched = enricher.enrich_record(&record).unwrap();

        assert_eq!(enriched[CREDIT_INCOME_RATIO], Value::Number(2.0));
        assert_eq!(enriched[ANNUITY_INCOME_RATIO], Value::Number(0.1));
        assert_eq!(enriched[DAYS_EMPLOYED], Value::Missing);
        // untouched
        assert_eq!(enriched["NAME_CONTRACT_TYPE"], Value::from("Cash loans"));
        assert_eq!(enriched[AMT_CREDIT], Value::Number(100000.0));
    }

    #[test]
    fn test_enrichment_is_idempotent() {
        let enricher = FeatureEnricher::new();
        let record = raw(100000.0.into(), 50000.0.into(), 5000.0.into(), 365243.0.into());

        let once = enricher.enrich_record(&record).unwrap();
        let twice = enricher.enrich_record(&once).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_sentinel_requires_exact_match() {
        let enricher = FeatureEnricher::new();
        let near = raw(1.0.into(), 1.0.into(), 1.0.into(), 365243.0001.into());
        let regular = raw(1.0.into(), 1.0.into(), 1.0.into(), (-1200.0).into());

        let near = enricher.enrich_record(&near).unwrap();
        let regular = enricher.enrich_record(&regular).unwrap();

        assert_eq!(near[DAYS_EMPLOYED], Value::Number(365243.0001));
        assert_eq!(regular[DAYS_EMPLOYED], Value::Number(-1200.0));
    }

    #[test]
    fn test_zero_or_missing_income_yields_missing_ratios() {
        let enricher = FeatureEnricher::new();

        for income in [Value::Number(0.0), Value::Missing] {
            let enriched = enricher
                .enrich_record(&raw(1000.0.into(), income, 100.0.into(), (-10.0).into()))
                .unwrap();
            assert_eq!(enriched[CREDIT_INCOME_RATIO], Value::Missing);
            assert_eq!(enriched[ANNUITY_INCOME_RATIO], Value::Missing);
        }

        let enriched = enricher
            .enrich_record(&raw(1000.0.into(), 500.0.into(), Value::Missing, (-10.0).into()))
            .unwrap();
        assert_eq!(enriched[CREDIT_INCOME_RATIO], Value::Number(2.0));
        assert_eq!(enriched[ANNUITY_INCOME_RATIO], Value::Missing);
    }

    #[test]
    fn test_rejects_absent_or_text_fields() {
        let enricher = FeatureEnricher::new();

        let mut record = raw(1.0.into(), 1.0.into(), 1.0.into(), 1.0.into());
        record.remove(AMT_ANNUITY);
        assert_eq!(
            enricher.enrich_record(&record),
            Err(EnrichmentError::MissingField(AMT_ANNUITY.into()))
        );

        let record = raw("lots".into(), 1.0.into(), 1.0.into(), 1.0.into());
        assert_eq!(
            enricher.enrich_record(&record),
            Err(EnrichmentError::NotNumeric(AMT_CREDIT.into()))
        );
    }

    #[test]
    fn test_record_set_gains_derived_columns() {
        let enricher = FeatureEnricher::new();
        let set = RecordSet::from_records(vec![raw(
            10.0.into(),
            5.0.into(),
            1.0.into(),
            (-3.0).into(),
        )]);

        let enriched = enricher.enrich(&set).unwrap();

        assert_eq!(enriched.len(), 1);
        assert!(enriched.has_column(CREDIT_INCOME_RATIO));
        assert!(enriched.has_column(ANNUITY_INCOME_RATIO));
        // input set is not mutated
        assert!(!set.has_column(CREDIT_INCOME_RATIO));
    }

    fn varied_records() -> Vec<Record> {
        vec![
            raw(200_000.0.into(), 50_000.0.into(), 10_000.0.into(), (-1_200.0).into()),
            raw(200_000.0.into(), 0.0.into(), 10_000.0.into(), DAYS_EMPLOYED_SENTINEL.into()),
            raw(Value::Missing, Value::Missing, 10_000.0.into(), Value::Missing),
            raw(1.0.into(), 3.0.into(), f64::MAX.into(), 365_242.0.into()),
        ]
    }

    #[test]
    fn test_set_enrichment_is_idempotent() {
        let enricher = FeatureEnricher::new();
        let set = RecordSet::from_records(varied_records());

        let once = enricher.enrich(&set).unwrap();
        let twice = enricher.enrich(&once).unwrap();

        assert_eq!(twice, once);
    }

    #[test]
    fn test_set_and_single_record_paths_agree() {
        let enricher = FeatureEnricher::new();
        let records = varied_records();
        let set = enricher
            .enrich_owned(RecordSet::from_records(records.clone()))
            .unwrap();

        for (raw_record, from_set) in records.iter().zip(set.records()) {
            let single = enricher.enrich_record(raw_record).unwrap();
            for name in enricher.derived_fields() {
                assert_eq!(field(&single, name), field(from_set, name), "{}", name);
            }
            assert_eq!(&single, from_set);
        }
    }

    #[test]
    fn test_failed_record_is_left_unchanged() {
        let enricher = FeatureEnricher::new();
        let mut record = raw(1.0.into(), 1.0.into(), "x".into(), DAYS_EMPLOYED_SENTINEL.into());
        let before = record.clone();

        assert!(enricher.enrich_in_place(&mut record).is_err());
        assert_eq!(record, before);
    }

    #[test]
    fn test_derived_keys_are_shared_across_records() {
        let enricher = FeatureEnricher::new();
        let set = enricher
            .enrich_owned(RecordSet::from_records(varied_records()))
            .unwrap();

        let key = |r: &Record| -> Arc<str> {
            r.keys()
                .find(|k| k.as_ref() == CREDIT_INCOME_RATIO)
                .cloned()
                .unwrap()
        };
        let first = key(&set.records()[0]);
        for record in &set.records()[1..] {
            assert!(Arc::ptr_eq(&first, &key(record)));
        }
    }
}
