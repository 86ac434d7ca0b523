//! Error types for the HTTP control API.
//!
//! Every variant is a client error; the pool itself never fails a request.
//! `IntoResponse` renders them as `400 Bad Request` with an
//! `{"error": "..."}` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Clone, Debug, thiserror::Error)]
pub enum ApiError {
    /// The `{count}` path segment was not a positive integer.
    #[error("invalid count")]
    InvalidCount { raw: String },

    /// The request body could not be decoded.
    #[error("invalid JSON")]
    InvalidJson { reason: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::InvalidCount { raw } => tracing::debug!(%raw, "rejecting invalid count"),
            Self::InvalidJson { reason } => tracing::debug!(%reason, "rejecting invalid JSON"),
        }
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}
