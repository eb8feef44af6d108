//! Integration test: scoring API endpoints

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use credit_scoring_pipeline::config::TrainingConfig;
use credit_scoring_pipeline::metrics::ScoringMetrics;
use credit_scoring_pipeline::models::forest::ForestConfig;
use credit_scoring_pipeline::server::{create_router, AppState};
use credit_scoring_pipeline::training::train_on_records;
use credit_scoring_pipeline::types::{Record, RecordSet, Value};
use credit_scoring_pipeline::ScoringService;
use std::sync::Arc;
use tower::ServiceExt;

fn synthetic_applications() -> RecordSet {
    let records = (0..100)
        .map(|i| {
            let defaulted = i % 4 == 0;
            let mut r = Record::new();
            r.insert("TARGET".into(), Value::Number(defaulted as u8 as f64));
            r.insert("AMT_INCOME_TOTAL".into(), Value::Number(70_000.0 + (i % 5) as f64 * 8_000.0));
            r.insert(
                "AMT_CREDIT".into(),
                Value::Number((if defaulted { 1_000_000.0 } else { 200_000.0 }) + i as f64),
            );
            r.insert("AMT_ANNUITY".into(), Value::Number(20_000.0));
            r.insert("DAYS_EMPLOYED".into(), Value::Number(-1_500.0 - i as f64));
            r.insert(
                "CODE_GENDER".into(),
                Value::from(if i % 2 == 0 { "F" } else { "M" }),
            );
            r
        })
        .collect();
    RecordSet::from_records(records)
}

fn loaded_service(dir: &std::path::Path) -> ScoringService {
    let cfg = TrainingConfig {
        input_path: String::new(),
        model_output_path: dir.join("model.json").display().to_string(),
        target_column: "TARGET".to_string(),
        test_size: 0.2,
        random_state: 42,
        forest: ForestConfig {
            n_estimators: 15,
            max_depth: Some(5),
            ..ForestConfig::default()
        },
    };
    let outcome = train_on_records(&cfg, synthetic_applications(), 0.5).unwrap();

    let service = ScoringService::new(0.5).unwrap();
    service.load(&outcome.model_path).unwrap();
    service
}

fn app_with(service: ScoringService) -> (axum::Router, Arc<ScoringMetrics>) {
    let metrics = Arc::new(ScoringMetrics::new());
    let state = Arc::new(AppState::new(Arc::new(service), metrics.clone()));
    (create_router(state), metrics)
}

fn predict_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const VALID_FEATURES: &str = r#"{"features": {
    "AMT_INCOME_TOTAL": 90000,
    "AMT_CREDIT": 950000,
    "AMT_ANNUITY": 20000,
    "DAYS_EMPLOYED": 365243,
    "CODE_GENDER": "X"
}}"#;

#[tokio::test]
async fn test_root_is_alive() {
    let (app, _) = app_with(ScoringService::new(0.5).unwrap());
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_predict_unloaded_is_503() {
    let (app, metrics) = app_with(ScoringService::new(0.5).unwrap());
    let response = app.oneshot(predict_request(VALID_FEATURES)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["detail"], "Le modèle n'est pas chargé.");
    assert_eq!(metrics.snapshot().unavailable, 1);
}

#[tokio::test]
async fn test_health_reports_unloaded() {
    let (app, _) = app_with(ScoringService::new(0.5).unwrap());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_loaded"], false);
    assert!(body["model_id"].is_null());
}

#[tokio::test]
async fn test_predict_loaded_returns_decision() {
    let dir = tempfile::tempdir().unwrap();
    let (app, metrics) = app_with(loaded_service(dir.path()));

    let response = app.oneshot(predict_request(VALID_FEATURES)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let probability = body["probability"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&probability));
    // at most four decimals
    assert!(((probability * 10_000.0).round() - probability * 10_000.0).abs() < 1e-6);
    assert_eq!(body["threshold_used"], 0.5);
    let decision = body["decision"].as_str().unwrap();
    if probability > 0.5 {
        assert_eq!(decision, "Refusé");
    } else if probability < 0.5 {
        assert_eq!(decision, "Accordé");
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.requests, 1);
    assert_eq!(snapshot.accepted + snapshot.refused, 1);
}

#[tokio::test]
async fn test_predict_malformed_json_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let (app, metrics) = app_with(loaded_service(dir.path()));

    let response = app.oneshot(predict_request("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].is_string());
    assert_eq!(metrics.snapshot().invalid_input, 1);
}

#[tokio::test]
async fn test_predict_missing_required_field_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with(loaded_service(dir.path()));

    let body = r#"{"features": {"AMT_INCOME_TOTAL": 90000, "AMT_CREDIT": 950000}}"#;
    let response = app.oneshot(predict_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().starts_with("Erreur de prédiction"));
}

#[tokio::test]
async fn test_predict_text_in_numeric_field_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with(loaded_service(dir.path()));

    let body = r#"{"features": {
        "AMT_INCOME_TOTAL": 90000,
        "AMT_CREDIT": "a lot",
        "AMT_ANNUITY": 20000,
        "DAYS_EMPLOYED": -100,
        "CODE_GENDER": "F"
    }}"#;
    let response = app.oneshot(predict_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = app_with(ScoringService::new(0.5).unwrap());
    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["requests"], 0);
    assert!(body["latency"].is_object());
}
