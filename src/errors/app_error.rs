//! Server-side error type for the credential issuer.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Errors returned by HTTP handlers.
///
/// Both variants map to a 500 response with a structured JSON body; request
/// handlers never panic or crash on provider failures. Credential material is
/// never included in error bodies.
#[derive(Debug, Error)]
pub enum AppError {
    /// Required configuration is missing (e.g. no provider API key)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The upstream provider call failed
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Result type for HTTP handlers.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match &self {
            AppError::Configuration(message) => json!({ "error": message }),
            AppError::Provider(detail) => json!({
                "error": "failed to create realtime session",
                "detail": detail,
            }),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
