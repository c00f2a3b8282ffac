use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{auth::AuthError, backend::BackendError};

/// ApiError
///
/// Error type of the session API. Implements `IntoResponse` so handlers can
/// return `Result<T, ApiError>`. The page gate never produces these.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Token(#[from] AuthError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Token(AuthError::Signing(e)) => {
                tracing::error!("Session signing failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SESSION_ERROR",
                    "Could not create a session".to_string(),
                )
            }
            ApiError::Token(AuthError::MissingRole) => (
                StatusCode::FORBIDDEN,
                "NO_ROLE",
                AuthError::MissingRole.to_string(),
            ),
            ApiError::Token(e) => (StatusCode::UNAUTHORIZED, "INVALID_SESSION", e.to_string()),
            ApiError::Backend(BackendError::Rejected(msg)) => {
                (StatusCode::UNAUTHORIZED, "REJECTED", msg.clone())
            }
            ApiError::Backend(e) => {
                tracing::error!("Backend error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "BACKEND_UNAVAILABLE",
                    "The authentication service is unavailable".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}
