//! HTTP error mapping

use crate::models::inference::ScoringError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Le modèle n'est pas chargé.")]
    ServiceUnavailable,

    #[error("Erreur de prédiction : {0}")]
    BadRequest(String),
}

impl From<ScoringError> for ServerError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::ServiceUnavailable => ServerError::ServiceUnavailable,
            ScoringError::InvalidInput(msg) => ServerError::BadRequest(msg),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
