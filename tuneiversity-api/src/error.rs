//! Error types for tuneiversity-api
//!
//! Every handler returns `ApiResult<T>`; the error side becomes a JSON body
//! `{"error": {"code": ..., "message": ...}}` with a matching status code.
//! Rejections produced by axum itself (unknown route, wrong method, body
//! limit) are rewritten into the same shape by [`json_rejections`].

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::services::scoring::ScoringError;

/// Largest framework rejection body copied into the JSON message
const MAX_REJECTION_BODY_BYTES: usize = 4096;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Upload over the configured body limit (413)
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    /// Scoring collaborator failure (502/503)
    #[error("Scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    /// tuneiversity-common error (database or configuration, 500)
    #[error("Common error: {0}")]
    Common(#[from] tuneiversity_common::Error),
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                msg.clone(),
            ),
            ApiError::Scoring(ScoringError::NotConfigured) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "AGENT_NOT_CONFIGURED",
                self.to_string(),
            ),
            ApiError::Scoring(ScoringError::MalformedReply(_)) => (
                StatusCode::BAD_GATEWAY,
                "MALFORMED_UPSTREAM_RESPONSE",
                self.to_string(),
            ),
            ApiError::Scoring(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", self.to_string()),
            ApiError::Common(tuneiversity_common::Error::Database(err)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                err.to_string(),
            ),
            ApiError::Common(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = self.parts();

        if status.is_server_error() {
            error!(code = error_code, "{}", message);
        } else {
            warn!(code = error_code, "{}", message);
        }

        error_body(status, error_code, &message)
    }
}

fn error_body(status: StatusCode, code: &str, message: &str) -> Response {
    let body = Json(json!({
        "error": {
            "code": code,
            "message": message,
        }
    }));

    (status, body).into_response()
}

/// Error code for a bare status produced outside the handlers
fn code_for_status(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        s if s.is_server_error() => "INTERNAL_ERROR",
        _ => "REQUEST_REJECTED",
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Rewrite non-JSON error responses into the API error envelope
///
/// Used with `axum::middleware::map_response`. Successful responses and
/// responses that are already JSON pass through untouched.
pub async fn json_rejections(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let message = match axum::body::to_bytes(body, MAX_REJECTION_BODY_BYTES).await {
        Ok(bytes) if !bytes.is_empty() => String::from_utf8_lossy(&bytes).trim().to_string(),
        _ => status.canonical_reason().unwrap_or("Request rejected").to_string(),
    };
    let code = code_for_status(status);
    warn!(code, status = status.as_u16(), "{}", message);

    let mut rewritten = error_body(status, code, &message);
    // Keep headers such as `Allow` on 405
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rewritten.headers_mut().insert(name.clone(), value.clone());
        }
    }
    rewritten
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    rewritten
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
