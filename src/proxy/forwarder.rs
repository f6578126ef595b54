//! Upstream forwarder
//!
//! Maps one inbound request onto the configured upstream and relays the
//! upstream's answer back without touching status, body, or content
//! headers. Only the upstream's message framing is left behind.

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::{debug, instrument};

use crate::{
    config::Config,
    error::ForwardError,
    proxy::headers::{strip_framing, strip_host},
};

/// Request as received under the prefix
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Everything after `<prefix>/`, still percent-encoded
    pub path: String,
    /// Raw query string without the leading `?`
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Request sent to the upstream
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Upstream answer, relayed unchanged to the caller
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Build `<base><prefix>/<path>`, adding `?<query>` only for a non-empty query
pub fn build_upstream_url(base: &str, prefix: &str, path: &str, query: Option<&str>) -> String {
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{}{}/{}?{}", base, prefix, path, q),
        None => format!("{}{}/{}", base, prefix, path),
    }
}

/// Build the HTTP client used for every upstream call
///
/// Redirects are relayed to the caller rather than followed, and the
/// timeout covers connect and read.
pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(100)
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

/// Forwarder bound to a single upstream origin
pub struct Forwarder {
    client: reqwest::Client,
    upstream_url: String,
    path_prefix: String,
    timeout: Duration,
}

impl Forwarder {
    /// Create a new forwarder sharing the given client
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            upstream_url: config.upstream_url.clone(),
            path_prefix: config.path_prefix.clone(),
            timeout: config.upstream_timeout,
        }
    }

    /// Upstream base URL
    pub fn upstream_url(&self) -> &str {
        &self.upstream_url
    }

    /// Map an inbound request onto the upstream
    pub fn build_outbound(&self, inbound: &InboundRequest) -> OutboundRequest {
        OutboundRequest {
            method: inbound.method.clone(),
            url: build_upstream_url(
                &self.upstream_url,
                &self.path_prefix,
                &inbound.path,
                inbound.query.as_deref(),
            ),
            headers: strip_host(&inbound.headers),
            body: inbound.body.clone(),
        }
    }

    /// Perform one round trip against the upstream
    ///
    /// Any upstream status, including 4xx/5xx and 3xx, is a successful
    /// result. Only transport failures produce an error. Besides `Host`,
    /// reqwest may add `content-length` and a default `accept: */*` to the
    /// outbound headers.
    #[instrument(skip(self, inbound), fields(method = %inbound.method, path = %inbound.path))]
    pub async fn forward(&self, inbound: InboundRequest) -> Result<UpstreamResponse, ForwardError> {
        let outbound = self.build_outbound(&inbound);
        let OutboundRequest {
            method,
            url,
            headers,
            body,
        } = outbound;

        debug!(
            url = %url,
            header_count = headers.len(),
            body_len = body.len(),
            "Sending request to upstream"
        );

        let mut request_builder = self.client.request(method, &url).headers(headers);
        // GET/HEAD bodies are forwarded too; only an empty body is left off
        if !body.is_empty() {
            request_builder = request_builder.body(body);
        }

        let response = request_builder
            .send()
            .await
            .map_err(|e| ForwardError::from_reqwest(&url, self.timeout, e))?;

        let status = response.status();
        let headers = strip_framing(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| ForwardError::from_reqwest(&url, self.timeout, e))?;

        debug!(
            url = %url,
            status = %status,
            body_len = body.len(),
            "Received response from upstream"
        );

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}
