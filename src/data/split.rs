//! Seeded stratified train/test split

use crate::error::{CreditScoringError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Row indices of the two partitions, each sorted ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split row indices so that every label keeps its proportion in both halves.
///
/// Each class contributes `round(count * test_size)` rows to the test set,
/// clamped so that both halves receive at least one row of the class. The
/// same labels, `test_size` and `seed` always produce the same split.
pub fn stratified_split(labels: &[f64], test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(CreditScoringError::Configuration(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        if !label.is_finite() {
            return Err(CreditScoringError::Data(format!(
                "label at row {} is not a number",
                idx
            )));
        }
        by_class.entry(label.round() as i64).or_default().push(idx);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for (class, mut indices) in by_class {
        if indices.len() < 2 {
            return Err(CreditScoringError::Data(format!(
                "class {} has {} row(s); stratified split needs at least 2",
                class,
                indices.len()
            )));
        }
        indices.shuffle(&mut rng);

        let n_test = ((indices.len() as f64 * test_size).round() as usize).clamp(1, indices.len() - 1);
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(TrainTestSplit { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(zeros: usize, ones: usize) -> Vec<f64> {
        let mut labels = vec![0.0; zeros];
        labels.extend(std::iter::repeat(1.0).take(ones));
        labels
    }

    #[test]
    fn test_class_proportions_preserved() {
        let y = labels(90, 10);
        let split = stratified_split(&y, 0.2, 42).unwrap();

        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);
        let test_ones = split.test.iter().filter(|&&i| y[i] == 1.0).count();
        assert_eq!(test_ones, 2);
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let y = labels(37, 13);
        let split = stratified_split(&y, 0.2, 7).unwrap();

        let mut all: Vec<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let y = labels(60, 40);
        assert_eq!(stratified_split(&y, 0.2, 42).unwrap(), stratified_split(&y, 0.2, 42).unwrap());
        assert_ne!(stratified_split(&y, 0.2, 42).unwrap(), stratified_split(&y, 0.2, 43).unwrap());
    }

    #[test]
    fn test_rejects_singleton_class() {
        let y = labels(10, 1);
        assert!(matches!(stratified_split(&y, 0.2, 42), Err(CreditScoringError::Data(_))));
    }

    #[test]
    fn test_rejects_bad_test_size() {
        let y = labels(10, 10);
        assert!(stratified_split(&y, 0.0, 42).is_err());
        assert!(stratified_split(&y, 1.0, 42).is_err());
    }
}
