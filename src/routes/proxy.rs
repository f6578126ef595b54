//! Prefix proxy handler
//!
//! Forwards every request under the configured prefix to the upstream
//! unchanged and relays the upstream's answer.

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::{
    error::{AppError, AppResult},
    proxy::{logging::RequestContext, InboundRequest},
    routes::metrics::{record_request, record_upstream_error},
    AppState,
};

/// Suffix of `path` after `<prefix>/`, or `None` when outside the prefix
pub fn captured_path<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    path.strip_prefix(prefix)?.strip_prefix('/')
}

/// Handler for `<prefix>/` and `<prefix>/*path`
pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let ctx = RequestContext::new(method.as_str(), uri.path());

    let path = captured_path(uri.path(), &state.config.path_prefix)
        .ok_or_else(|| AppError::NotFound(uri.path().to_string()))?;

    let inbound = InboundRequest {
        method: method.clone(),
        path: path.to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    };

    ctx.log_request_start(inbound.body.len());

    match state.forwarder.forward(inbound).await {
        Ok(upstream) => {
            ctx.log_upstream_response(upstream.status.as_u16(), upstream.body.len());
            record_request(method.as_str(), upstream.status.as_u16(), ctx.elapsed_secs());
            Ok(upstream.into_response())
        }
        Err(e) => {
            ctx.log_failure(&e);
            record_upstream_error(e.kind());
            Err(e.into())
        }
    }
}
