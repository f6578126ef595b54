//! Proxy module
//!
//! Handles request forwarding to the upstream service.

pub mod forwarder;
pub mod headers;
pub mod logging;

pub use forwarder::{Forwarder, InboundRequest, OutboundRequest, UpstreamResponse};
