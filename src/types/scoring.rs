//! Scoring result and the threshold decision rule

use serde::{Deserialize, Serialize};

/// Business decision derived from the default probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "Accordé")]
    Accepted,
    #[serde(rename = "Refusé")]
    Refused,
}

impl Decision {
    /// Apply the threshold rule. A probability equal to the threshold is
    /// accepted; only a strictly greater one is refused.
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability > threshold {
            Decision::Refused
        } else {
            Decision::Accepted
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Accepted => "Accordé",
            Decision::Refused => "Refusé",
        }
    }
}

/// Result returned for one scored application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    /// P(default), rounded to 4 decimals
    pub probability: f64,
    pub decision: Decision,
    pub threshold_used: f64,
}

impl ScoringResult {
    /// Build a result from the raw model probability. The decision uses the
    /// unrounded value.
    pub fn new(probability: f64, threshold: f64) -> Self {
        Self {
            probability: round_probability(probability),
            decision: Decision::from_probability(probability, threshold),
            threshold_used: threshold,
        }
    }
}

/// Round to 4 decimal places.
pub fn round_probability(p: f64) -> f64 {
    (p * 10_000.0).round() / 10_000.0
}
