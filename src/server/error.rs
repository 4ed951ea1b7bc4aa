use crate::api::fetch::FetchError;
use crate::services::proxy::ProxyError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

const DETAILS_LIMIT: usize = 500;

/// Errors surfaced by the proxy routes, rendered as a JSON envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream request failed with {status}")]
    Upstream { status: u16, details: String },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ProxyError> for AppError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::Validation(msg) => AppError::BadRequest(msg),
            ProxyError::Fetch(FetchError::Upstream { status, body })
            | ProxyError::Fetch(FetchError::RetriesExhausted { status, body, .. }) => {
                AppError::Upstream {
                    status,
                    details: snippet(&body),
                }
            }
            ProxyError::Fetch(other) => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("{}", self);

        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Upstream { status, details } => (
                StatusCode::BAD_GATEWAY,
                json!({
                    "error": "Upstream request failed",
                    "status": status,
                    "details": details
                }),
            ),
            AppError::Internal(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Internal server error",
                    "details": details
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

fn snippet(body: &str) -> String {
    match body.char_indices().nth(DETAILS_LIMIT) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}
