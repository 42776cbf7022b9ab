//! API error mapping.
//!
//! Library errors stay typed (`CoreError`); at the HTTP boundary they become
//! an [`ApiError`] rendered as a `{"detail": "..."}` body with the matching
//! status code.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eps_core::CoreError;
use serde_json::json;

/// Failure surfaced to API clients.
#[derive(Debug)]
pub(crate) enum ApiError {
    /// Unknown patient key, or no identity resource in the bundle.
    NotFound(String),
    /// Missing or malformed request input.
    BadRequest(String),
    /// Server-side failure; the detail is logged, not sent to the client.
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            ),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::UnknownPatient { .. } => ApiError::NotFound(err.to_string()),
            _ => {
                tracing::error!("bundle load error: {err}");
                ApiError::Internal
            }
        }
    }
}
