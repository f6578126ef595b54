//! Request logging utilities for upstream forwarding
//!
//! Provides structured logging with a short correlation ID so the lines
//! emitted for one forwarded request can be grouped together.

use std::time::Instant;

use tracing::{error, info};
use uuid::Uuid;

use crate::error::ForwardError;

/// Context for tracking a forwarded request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request (for log correlation)
    pub trace_id: String,
    /// When the request started
    pub start_time: Instant,
    /// HTTP method of the inbound request
    pub method: String,
    /// Inbound path, prefix included
    pub path: String,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string()[..8].to_string(), // Short ID for readability
            start_time: Instant::now(),
            method: method.to_string(),
            path: path.to_string(),
        }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    /// Get elapsed time in seconds
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Log request initiation
    pub fn log_request_start(&self, body_len: usize) {
        info!(
            trace_id = %self.trace_id,
            method = %self.method,
            path = %self.path,
            body_len = %body_len,
            "Forwarding request"
        );
    }

    /// Log response received from upstream
    pub fn log_upstream_response(&self, status: u16, body_len: usize) {
        info!(
            trace_id = %self.trace_id,
            method = %self.method,
            path = %self.path,
            status = %status,
            body_len = %body_len,
            elapsed_ms = %self.elapsed_ms(),
            "Response relayed from upstream"
        );
    }

    /// Log a failed forward, picking the message by failure kind
    pub fn log_failure(&self, err: &ForwardError) {
        match err {
            ForwardError::Timeout { timeout, .. } => self.log_timeout(timeout.as_millis()),
            ForwardError::Unreachable { url, .. } => {
                self.log_connection_error(&err.to_string(), url)
            }
            ForwardError::Transport { .. } => self.log_error(&err.to_string()),
        }
    }

    /// Log request failure
    pub fn log_error(&self, error: &str) {
        error!(
            trace_id = %self.trace_id,
            method = %self.method,
            path = %self.path,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Request failed"
        );
    }

    /// Log connection error
    pub fn log_connection_error(&self, error: &str, url: &str) {
        error!(
            trace_id = %self.trace_id,
            url = %url,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Connection to upstream failed"
        );
    }

    /// Log timeout
    pub fn log_timeout(&self, timeout_ms: u128) {
        error!(
            trace_id = %self.trace_id,
            method = %self.method,
            path = %self.path,
            timeout_ms = %timeout_ms,
            elapsed_ms = %self.elapsed_ms(),
            "Request timed out"
        );
    }
}
