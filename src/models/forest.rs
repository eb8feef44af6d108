//! Random forest classifier with balanced class weights

use super::tree::DecisionTree;
use super::ProbabilisticClassifier;
use crate::error::{CreditScoringError, Result};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    /// Maximum depth per tree, unbounded when absent
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    /// Weight each class by `n_samples / (2 * n_class)`
    #[serde(default = "default_balanced")]
    pub balanced_class_weight: bool,
}

fn default_n_estimators() -> usize {
    200
}

fn default_min_samples_split() -> usize {
    2
}

fn default_min_samples_leaf() -> usize {
    1
}

fn default_balanced() -> bool {
    true
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            balanced_class_weight: default_balanced(),
        }
    }
}

/// Bagged ensemble of [`DecisionTree`]s; probability is the mean of the
/// trees' leaf shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    config: ForestConfig,
    random_state: u64,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForestClassifier {
    /// Fit a forest on a 0/1 target. Trees are grown in parallel, each from
    /// its own seed derived from `random_state`, so results do not depend on
    /// thread scheduling.
    pub fn fit(
        config: ForestConfig,
        random_state: u64,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(CreditScoringError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(CreditScoringError::Training(
                "cannot fit a forest on zero samples".to_string(),
            ));
        }
        if config.n_estimators == 0 {
            return Err(CreditScoringError::Training(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if let Some(bad) = y.iter().find(|&&v| v != 0.0 && v != 1.0) {
            return Err(CreditScoringError::Training(format!(
                "binary target expected, found label {}",
                bad
            )));
        }

        let labels: Vec<f64> = y.to_vec();
        let weights = sample_weights(&labels, config.balanced_class_weight);
        let max_features = sqrt_features(n_features);

        info!(
            n_estimators = config.n_estimators,
            n_samples,
            n_features,
            max_features,
            max_depth = ?config.max_depth,
            "Fitting random forest"
        );

        let trees: Vec<DecisionTree> = (0..config.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = random_state.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let bootstrap: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();

                let mut tree = DecisionTree::new()
                    .with_max_depth(config.max_depth)
                    .with_min_samples_split(config.min_samples_split)
                    .with_min_samples_leaf(config.min_samples_leaf)
                    .with_max_features(max_features);
                tree.fit(x, &labels, &weights, bootstrap, &mut rng);
                tree
            })
            .collect();

        Ok(Self {
            config,
            random_state,
            trees,
            n_features,
        })
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn random_state(&self) -> u64 {
        self.random_state
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl ProbabilisticClassifier for RandomForestClassifier {
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_features {
            return Err(CreditScoringError::Shape {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let n_trees = self.trees.len().max(1) as f64;
        let probabilities: Vec<f64> = x
            .outer_iter()
            .map(|row| {
                let row = row.to_vec();
                let sum: f64 = self.trees.iter().map(|t| t.predict_row(&row)).sum();
                (sum / n_trees).clamp(0.0, 1.0)
            })
            .collect();

        Ok(Array1::from_vec(probabilities))
    }

    fn n_features(&self) -> usize {
        self.n_features
    }
}

/// Features tried per split: `floor(sqrt(n))`, at least one.
fn sqrt_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().floor() as usize).max(1)
}

/// Per-row weights; balanced mode gives each class the same total weight.
fn sample_weights(labels: &[f64], balanced: bool) -> Vec<f64> {
    if !balanced {
        return vec![1.0; labels.len()];
    }

    let n = labels.len() as f64;
    let n_pos = labels.iter().filter(|&&v| v > 0.5).count() as f64;
    let n_neg = n - n_pos;
    let w_pos = if n_pos > 0.0 { n / (2.0 * n_pos) } else { 0.0 };
    let w_neg = if n_neg > 0.0 { n / (2.0 * n_neg) } else { 0.0 };

    labels
        .iter()
        .map(|&v| if v > 0.5 { w_pos } else { w_neg })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_per_split_rounds_down() {
        assert_eq!(sqrt_features(0), 1);
        assert_eq!(sqrt_features(1), 1);
        assert_eq!(sqrt_features(3), 1);
        assert_eq!(sqrt_features(9), 3);
        assert_eq!(sqrt_features(10), 3);
        assert_eq!(sqrt_features(15), 3);
        assert_eq!(sqrt_features(16), 4);
    }
    use ndarray::array;

    fn toy() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 5.0],
            [0.1, 4.0],
            [0.2, 6.0],
            [0.3, 5.5],
            [0.9, 5.0],
            [1.0, 4.5],
            [1.1, 6.0],
            [1.2, 5.2]
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_estimators: 25,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn test_forest_ranks_classes() {
        let (x, y) = toy();
        let forest = RandomForestClassifier::fit(small_config(), 42, &x, &y).unwrap();

        let probs = forest.predict_proba(&array![[0.05, 5.0], [1.15, 5.0]]).unwrap();
        assert!(probs[0] < probs[1]);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(forest.n_trees(), 25);
    }

    #[test]
    fn test_forest_is_deterministic_for_a_seed() {
        let (x, y) = toy();
        let a = RandomForestClassifier::fit(small_config(), 7, &x, &y).unwrap();
        let b = RandomForestClassifier::fit(small_config(), 7, &x, &y).unwrap();

        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_rejects_non_binary_target_and_bad_width() {
        let (x, _) = toy();
        let y = array![0.0, 1.0, 2.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        assert!(RandomForestClassifier::fit(small_config(), 1, &x, &y).is_err());

        let (x, y) = toy();
        let forest = RandomForestClassifier::fit(small_config(), 1, &x, &y).unwrap();
        assert!(forest.predict_proba(&array![[1.0]]).is_err());
    }

    #[test]
    fn test_balanced_weights() {
        let w = sample_weights(&[0.0, 0.0, 0.0, 1.0], true);
        // 4 / (2 * 3) and 4 / (2 * 1)
        assert!((w[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((w[3] - 2.0).abs() < 1e-12);
        assert_eq!(sample_weights(&[0.0, 1.0], false), vec![1.0, 1.0]);
    }
}
