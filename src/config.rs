//! Configuration management for the relay
//!
//! Configuration is loaded from environment variables once at startup and
//! is read-only afterwards.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Bound on a single upstream round trip (connect + read)
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Default inbound body cap (25 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Upstream base URL, without a trailing slash
    pub upstream_url: String,
    /// Prefix mirrored onto the upstream, e.g. `/api`
    pub path_prefix: String,
    /// Timeout applied to every upstream call
    pub upstream_timeout: Duration,

    /// Largest inbound body accepted; 0 disables the cap
    pub max_body_bytes: usize,

    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let upstream_url = normalize_upstream_url(
            &lookup("UPSTREAM_URL")
                .or_else(|| lookup("NODE_SERVER_URL"))
                .unwrap_or_else(|| "http://localhost:8080".to_string()),
        )?;
        let path_prefix = normalize_prefix(
            &lookup("RELAY_PATH_PREFIX").unwrap_or_else(|| "/api".to_string()),
        )?;

        Ok(Self {
            host: lookup("RELAY_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("RELAY_PORT")
                .unwrap_or_else(|| "8001".to_string())
                .parse()
                .context("Invalid RELAY_PORT")?,

            upstream_url,
            path_prefix,
            upstream_timeout: UPSTREAM_TIMEOUT,

            max_body_bytes: match lookup("RELAY_MAX_BODY_BYTES") {
                Some(v) => v.parse().context("Invalid RELAY_MAX_BODY_BYTES")?,
                None => DEFAULT_MAX_BODY_BYTES,
            },

            json_logs: lookup("RELAY_LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    /// Build a config pointing at the given upstream with default settings
    pub fn for_upstream(upstream_url: &str) -> Result<Self> {
        let upstream_url = upstream_url.to_string();
        Self::from_lookup(move |key| match key {
            "UPSTREAM_URL" => Some(upstream_url.clone()),
            _ => None,
        })
    }
}

/// Validate the upstream base URL and drop any trailing slash
fn normalize_upstream_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("UPSTREAM_URL must not be empty");
    }

    let parsed = reqwest::Url::parse(trimmed)
        .with_context(|| format!("Invalid UPSTREAM_URL: {}", trimmed))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("UPSTREAM_URL must use http or https, got {}", parsed.scheme());
    }
    if parsed.query().is_some() {
        bail!("UPSTREAM_URL must not carry a query string");
    }

    Ok(trimmed.to_string())
}

/// Prefix must start with `/`; a trailing `/` is removed (`/` alone becomes empty)
fn normalize_prefix(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && !trimmed.starts_with('/') {
        bail!("RELAY_PATH_PREFIX must start with '/', got {}", trimmed);
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
