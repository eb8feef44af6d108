//! Application state shared across handlers

use crate::metrics::ScoringMetrics;
use crate::models::inference::ScoringService;
use std::sync::Arc;

pub struct AppState {
    pub service: Arc<ScoringService>,
    pub metrics: Arc<ScoringMetrics>,
}

impl AppState {
    pub fn new(service: Arc<ScoringService>, metrics: Arc<ScoringMetrics>) -> Self {
        Self { service, metrics }
    }
}
