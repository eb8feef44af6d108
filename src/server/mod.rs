//! HTTP scoring server
//!
//! `GET /` liveness, `POST /predict` scoring, `GET /health` readiness and
//! `GET /metrics` counters.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use handlers::{HealthResponse, ScoringRequest};
pub use state::AppState;

use crate::config::{ScoringConfig, ServerConfig};
use crate::metrics::{MetricsReporter, ScoringMetrics};
use crate::models::inference::ScoringService;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Build the scoring service and try to load the configured model.
///
/// A failed load is logged and leaves the service unloaded: the server still
/// starts and `/predict` answers 503 until restarted with a valid model.
pub fn build_service(server: &ServerConfig, scoring: &ScoringConfig) -> anyhow::Result<ScoringService> {
    let service = ScoringService::new(scoring.threshold)?;
    match service.load(&server.model_path) {
        Ok(()) => info!(model_path = %server.model_path, "Model loaded"),
        Err(e) => error!(
            model_path = %server.model_path,
            error = %e,
            "Failed to load model, serving without one"
        ),
    }
    Ok(service)
}

/// Start the server and block until ctrl+c.
pub async fn run_server(server: ServerConfig, scoring: ScoringConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    let service = Arc::new(build_service(&server, &scoring)?);
    let metrics = Arc::new(ScoringMetrics::new());

    if server.metrics_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), server.metrics_interval_secs);
        tokio::spawn(reporter.start());
    }

    let state = Arc::new(AppState::new(service.clone(), metrics.clone()));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", server.host, server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        address = %addr,
        model_loaded = service.is_ready(),
        threshold = scoring.threshold,
        started_at = %start_time.to_rfc3339(),
        "Credit scoring API listening"
    );

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c, shutting down");
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    metrics.print_summary();
    info!("Server shut down cleanly");
    Ok(())
}
