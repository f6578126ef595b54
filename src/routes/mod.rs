//! HTTP routes for the relay
//!
//! The prefix routes forward to the upstream; health and metrics are
//! answered locally.

pub mod health;
pub mod metrics;
pub mod proxy;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, on, MethodFilter},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Methods relayed to the upstream; anything else gets 405
pub const PROXY_METHODS: MethodFilter = MethodFilter::GET
    .or(MethodFilter::POST)
    .or(MethodFilter::PUT)
    .or(MethodFilter::DELETE)
    .or(MethodFilter::PATCH)
    .or(MethodFilter::OPTIONS)
    .or(MethodFilter::HEAD);

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let prefix = state.config.path_prefix.clone();
    let body_limit = match state.config.max_body_bytes {
        0 => DefaultBodyLimit::disable(),
        max => DefaultBodyLimit::max(max),
    };

    // No CORS or compression layers here: relayed headers and bodies must
    // reach the caller exactly as the upstream sent them
    let proxy_routes = Router::new()
        .route(&format!("{}/", prefix), on(PROXY_METHODS, proxy::proxy_handler))
        .route(&format!("{}/*path", prefix), on(PROXY_METHODS, proxy::proxy_handler))
        .layer(body_limit);

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    Router::new()
        .merge(public_routes)
        .merge(proxy_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
