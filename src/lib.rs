//! api-relay - Transparent HTTP reverse proxy
//!
//! Mirrors every request under a path prefix onto a single upstream and
//! relays the upstream's response unchanged.

pub mod config;
pub mod error;
pub mod proxy;
pub mod routes;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

pub use crate::config::Config;
pub use crate::error::{AppError, ForwardError};
pub use crate::proxy::Forwarder;

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    /// Forwarder for the configured upstream
    pub forwarder: Arc<Forwarder>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // Pooled client shared by every forward
        let http_client = proxy::forwarder::build_client(config.upstream_timeout)?;

        let forwarder = Arc::new(Forwarder::new(http_client, &config));

        Ok(Self {
            config,
            start_time: Instant::now(),
            forwarder,
        })
    }
}
