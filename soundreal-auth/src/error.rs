//! Error types for soundreal-auth

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::identity::IdentityError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Profile store could not answer (503)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Identity provider failed (502)
    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
            ApiError::Identity(_) => (StatusCode::BAD_GATEWAY, "IDENTITY_PROVIDER_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "Request failed");
        }

        // Upstream detail stays in the log
        let message = match &self {
            ApiError::Unavailable(_) => "Profile store unavailable".to_string(),
            ApiError::Identity(_) => "Identity provider unavailable".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
