//! Hold-out evaluation: ROC AUC and a per-class classification report

use serde::{Deserialize, Serialize};
use std::fmt;

/// Evaluation recorded alongside a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// `None` when the evaluation set holds a single class
    pub roc_auc: Option<f64>,
    /// Threshold used to turn probabilities into class predictions
    pub threshold: f64,
    pub n_train: usize,
    pub n_test: usize,
    pub classification: ClassificationReport,
}

impl EvaluationReport {
    /// Evaluate default probabilities against true 0/1 labels.
    pub fn evaluate(y_true: &[f64], probabilities: &[f64], threshold: f64, n_train: usize) -> Self {
        let y_pred: Vec<f64> = probabilities
            .iter()
            .map(|&p| if p > threshold { 1.0 } else { 0.0 })
            .collect();

        Self {
            roc_auc: roc_auc(y_true, probabilities),
            threshold,
            n_train,
            n_test: y_true.len(),
            classification: ClassificationReport::compute(y_true, &y_pred),
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.roc_auc {
            Some(auc) => writeln!(f, "ROC AUC: {:.4}", auc)?,
            None => writeln!(f, "ROC AUC: undefined (single class)")?,
        }
        writeln!(f, "Threshold: {}", self.threshold)?;
        writeln!(f, "Train rows: {}, test rows: {}", self.n_train, self.n_test)?;
        write!(f, "{}", self.classification)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub support: usize,
}

impl ClassificationReport {
    /// Binary report over classes 0 and 1. Undefined ratios count as 0.
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Self {
        let total = y_true.len().min(y_pred.len());
        let pairs: Vec<(bool, bool)> = y_true
            .iter()
            .zip(y_pred)
            .map(|(&t, &p)| (t >= 0.5, p >= 0.5))
            .collect();

        let classes: Vec<ClassMetrics> = [false, true]
            .iter()
            .map(|&positive| {
                let tp = pairs.iter().filter(|&&(t, p)| t == positive && p == positive).count();
                let fp = pairs.iter().filter(|&&(t, p)| t != positive && p == positive).count();
                let fn_ = pairs.iter().filter(|&&(t, p)| t == positive && p != positive).count();

                let precision = ratio(tp, tp + fp);
                let recall = ratio(tp, tp + fn_);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label: if positive { "1" } else { "0" }.to_string(),
                    precision,
                    recall,
                    f1,
                    support: tp + fn_,
                }
            })
            .collect();

        let correct = pairs.iter().filter(|&&(t, p)| t == p).count();
        let n_classes = classes.len() as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n_classes,
        };
        let weighted = |metric: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes.iter().map(|c| metric(c) * c.support as f64).sum::<f64>() / total as f64
            }
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
        };

        Self {
            accuracy: ratio(correct, total),
            classes,
            macro_avg,
            weighted_avg,
            support: total,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
        for class in &self.classes {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                class.label, class.precision, class.recall, class.f1, class.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>14} {:>10} {:>10} {:>10.2} {:>10}", "accuracy", "", "", self.accuracy, self.support)?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, avg.precision, avg.recall, avg.f1, self.support
            )?;
        }
        Ok(())
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Area under the ROC curve via the rank-sum statistic, tied scores sharing
/// their average rank. Returns `None` unless both classes are present.
pub fn roc_auc(y_true: &[f64], scores: &[f64]) -> Option<f64> {
    if y_true.len() != scores.len() {
        return None;
    }

    let n_pos = y_true.iter().filter(|&&y| y >= 0.5).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1 ..= j+1 share their mean
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            if y_true[idx] >= 0.5 {
                rank_sum_pos += avg_rank;
            }
        }
        i = j + 1;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}
