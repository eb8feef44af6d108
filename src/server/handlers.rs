//! Request handlers

use super::error::{Result, ServerError};
use super::state::AppState;
use crate::metrics::{MetricsSnapshot, RequestOutcome};
use crate::types::scoring::ScoringResult;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Body of `POST /predict`
#[derive(Debug, Deserialize)]
pub struct ScoringRequest {
    pub features: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub model_id: Option<String>,
    pub version: &'static str,
}

pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "API de Credit Scoring en ligne. Utilisez POST /predict pour scorer une demande.",
    }))
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ScoringRequest>, JsonRejection>,
) -> Result<Json<ScoringResult>> {
    let start = Instant::now();

    // an unloaded service answers 503 whatever the body looks like
    if !state.service.is_ready() {
        state.metrics.record(RequestOutcome::Unavailable, start.elapsed());
        warn!("Prediction requested before the model was loaded");
        return Err(ServerError::ServiceUnavailable);
    }

    let Json(request) = payload.map_err(|rejection| {
        state.metrics.record(RequestOutcome::InvalidInput, start.elapsed());
        ServerError::from(rejection)
    })?;

    match state.service.score_features(&request.features) {
        Ok(result) => {
            let elapsed = start.elapsed();
            state.metrics.record(RequestOutcome::Scored(&result), elapsed);
            info!(
                probability = result.probability,
                decision = result.decision.as_str(),
                latency_us = elapsed.as_micros() as u64,
                "Application scored"
            );
            Ok(Json(result))
        }
        Err(err) => {
            let err = ServerError::from(err);
            let outcome = match err {
                ServerError::ServiceUnavailable => RequestOutcome::Unavailable,
                ServerError::BadRequest(_) => RequestOutcome::InvalidInput,
            };
            state.metrics.record(outcome, start.elapsed());
            warn!(error = %err, "Scoring failed");
            Err(err)
        }
    }
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_loaded: state.service.is_ready(),
        model_id: state.service.model_id().map(|id| id.to_string()),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
