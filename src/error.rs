//! Error types for the relay
//!
//! `ForwardError` is the failure result of a single forward operation.
//! `AppError` is what request handlers return; it decides the status code
//! the original caller sees.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure of one upstream round trip
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Upstream did not answer {url} within {timeout:?}")]
    Timeout {
        url: String,
        timeout: Duration,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upstream unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upstream transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ForwardError {
    /// Classify a reqwest failure for the given target URL
    pub fn from_reqwest(url: &str, timeout: Duration, source: reqwest::Error) -> Self {
        let url = url.to_string();
        if source.is_timeout() {
            ForwardError::Timeout {
                url,
                timeout,
                source,
            }
        } else if source.is_connect() {
            ForwardError::Unreachable { url, source }
        } else {
            ForwardError::Transport { url, source }
        }
    }

    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Timeout { .. } => "timeout",
            ForwardError::Unreachable { .. } => "unreachable",
            ForwardError::Transport { .. } => "transport",
        }
    }

    /// Target URL of the failed call
    pub fn url(&self) -> &str {
        match self {
            ForwardError::Timeout { url, .. }
            | ForwardError::Unreachable { url, .. }
            | ForwardError::Transport { url, .. } => url,
        }
    }
}

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Forward(#[from] ForwardError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Forward(ForwardError::Timeout { .. }) => (
                StatusCode::GATEWAY_TIMEOUT,
                "UPSTREAM_TIMEOUT",
                "Upstream service timed out".to_string(),
            ),
            AppError::Forward(ForwardError::Unreachable { .. }) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_UNAVAILABLE",
                "Upstream service unavailable".to_string(),
            ),
            AppError::Forward(ForwardError::Transport { .. }) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "Upstream service error".to_string(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
