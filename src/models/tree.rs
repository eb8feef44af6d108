//! Weighted binary classification tree (Gini impurity)

use ndarray::Array2;
use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Tree node stored in a flat arena; children are indices into `nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Weighted share of the positive class among the samples reaching it
    Leaf { value: f64 },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Binary decision tree grown on sample weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split, all when `None`
    pub max_features: Option<usize>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

struct PendingNode {
    slot: usize,
    indices: Vec<usize>,
    depth: usize,
}

struct Split {
    feature_idx: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn is_fitted(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Grow the tree on the rows listed in `indices` (repeats allowed, as
    /// produced by bootstrap sampling). `y` holds 0/1 labels and `weights`
    /// per-row sample weights.
    pub fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &[f64],
        weights: &[f64],
        indices: Vec<usize>,
        rng: &mut ChaCha8Rng,
    ) {
        self.nodes.clear();
        self.nodes.push(TreeNode::Leaf { value: 0.0 });

        // explicit stack: unbounded trees can be deeper than the call stack allows
        let mut stack = vec![PendingNode {
            slot: 0,
            indices,
            depth: 0,
        }];

        while let Some(node) = stack.pop() {
            let (w0, w1) = class_weights(&node.indices, y, weights);
            self.nodes[node.slot] = TreeNode::Leaf {
                value: positive_share(w0, w1),
            };

            let stop = node.indices.len() < self.min_samples_split
                || self.max_depth.is_some_and(|d| node.depth >= d)
                || w0 == 0.0
                || w1 == 0.0;
            if stop {
                continue;
            }

            let parent = (w0 + w1) * gini(w0, w1);
            let Some(split) = self.best_split(x, y, weights, &node.indices, (w0, w1), rng) else {
                continue;
            };
            if split.impurity >= parent - 1e-12 {
                continue;
            }

            let (left, right): (Vec<usize>, Vec<usize>) = node
                .indices
                .iter()
                .partition(|&&i| x[[i, split.feature_idx]] <= split.threshold);

            let left_slot = self.nodes.len();
            self.nodes.push(TreeNode::Leaf { value: 0.0 });
            let right_slot = self.nodes.len();
            self.nodes.push(TreeNode::Leaf { value: 0.0 });

            self.nodes[node.slot] = TreeNode::Split {
                feature_idx: split.feature_idx,
                threshold: split.threshold,
                left: left_slot,
                right: right_slot,
            };

            stack.push(PendingNode {
                slot: right_slot,
                indices: right,
                depth: node.depth + 1,
            });
            stack.push(PendingNode {
                slot: left_slot,
                indices: left,
                depth: node.depth + 1,
            });
        }
    }

    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &[f64],
        weights: &[f64],
        indices: &[usize],
        totals: (f64, f64),
        rng: &mut ChaCha8Rng,
    ) -> Option<Split> {
        let n_features = x.ncols();
        let n_try = self.max_features.unwrap_or(n_features).clamp(1, n_features.max(1));
        if n_features == 0 {
            return None;
        }

        let mut best: Option<Split> = None;
        let mut column: Vec<(f64, usize)> = Vec::with_capacity(indices.len());
        let (total0, total1) = totals;

        for feature_idx in sample(rng, n_features, n_try).into_iter() {
            column.clear();
            column.extend(indices.iter().map(|&i| (x[[i, feature_idx]], i)));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let (mut left0, mut left1) = (0.0, 0.0);

            for pos in 0..column.len() - 1 {
                let (value, row) = column[pos];
                if y[row] > 0.5 {
                    left1 += weights[row];
                } else {
                    left0 += weights[row];
                }

                let next = column[pos + 1].0;
                if value == next {
                    continue;
                }
                let n_left = pos + 1;
                if n_left < self.min_samples_leaf || column.len() - n_left < self.min_samples_leaf {
                    continue;
                }

                let (right0, right1) = (total0 - left0, total1 - left1);
                let impurity =
                    (left0 + left1) * gini(left0, left1) + (right0 + right1) * gini(right0, right1);

                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    best = Some(Split {
                        feature_idx,
                        threshold: value + (next - value) / 2.0,
                        impurity,
                    });
                }
            }
        }

        best
    }

    /// Positive-class probability for one feature row.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return *value,
                Some(TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = row.get(*feature_idx).copied().unwrap_or(f64::NAN);
                    idx = if v <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }
}

fn class_weights(indices: &[usize], y: &[f64], weights: &[f64]) -> (f64, f64) {
    indices.iter().fold((0.0, 0.0), |(w0, w1), &i| {
        if y[i] > 0.5 {
            (w0, w1 + weights[i])
        } else {
            (w0 + weights[i], w1)
        }
    })
}

fn positive_share(w0: f64, w1: f64) -> f64 {
    let total = w0 + w1;
    if total > 0.0 {
        w1 / total
    } else {
        0.0
    }
}

fn gini(w0: f64, w1: f64) -> f64 {
    let total = w0 + w1;
    if total <= 0.0 {
        return 0.0;
    }
    let (p0, p1) = (w0 / total, w1 / total);
    1.0 - p0 * p0 - p1 * p1
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    #[test]
    fn test_tree_separates_simple_threshold() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let w = [1.0; 6];
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y, &w, (0..6).collect(), &mut rng);

        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.predict_row(&[2.5]), 0.0);
        assert_eq!(tree.predict_row(&[11.5]), 1.0);
        // midpoint threshold
        assert_eq!(tree.predict_row(&[6.4]), 0.0);
        assert_eq!(tree.predict_row(&[6.6]), 1.0);
    }

    #[test]
    fn test_max_depth_zero_is_a_weighted_leaf() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = [0.0, 0.0, 1.0];
        let w = [1.0, 1.0, 2.0];
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let mut tree = DecisionTree::new().with_max_depth(Some(0));
        tree.fit(&x, &y, &w, (0..3).collect(), &mut rng);

        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_row(&[5.0]), 0.5);
    }

    #[test]
    fn test_weighted_split_and_leaf_shares() {
        let x = array![[0.0, 5.0], [1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        let y = [0.0, 0.0, 1.0, 1.0];
        let w = [1.0, 3.0, 2.0, 2.0];
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let mut tree = DecisionTree::new().with_max_depth(Some(1));
        tree.fit(&x, &y, &w, vec![0, 1, 1, 2, 3], &mut rng);

        // only the first feature separates the classes
        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.predict_row(&[0.5, 5.0]), 0.0);
        assert_eq!(tree.predict_row(&[2.5, 5.0]), 1.0);
    }

    #[test]
    fn test_constant_feature_yields_leaf() {
        let x = array![[1.0], [1.0], [1.0], [1.0]];
        let y = [0.0, 1.0, 0.0, 1.0];
        let w = [1.0; 4];
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y, &w, (0..4).collect(), &mut rng);

        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_row(&[1.0]), 0.5);
    }
}
