//! Header utilities for upstream forwarding
//!
//! The relay forwards every inbound header except `Host`, which the
//! transport sets from the upstream URL. On the way back only the
//! message-framing headers are dropped, since the relayed body is
//! re-framed by the server.

use axum::http::header::{self, HeaderMap, HeaderName, HOST};

/// Framing headers owned by the connection the upstream answered on
const FRAMING_HEADERS: &[HeaderName] = &[header::CONNECTION, header::TRANSFER_ENCODING];

/// Copy all headers into a new map, leaving out `Host`
///
/// Multi-valued headers keep every value in their original order. The
/// source map is left untouched. The HTTP client still sets `Host`,
/// `content-length` for a non-empty body, and `accept: */*` when the
/// caller sent no `Accept`.
pub fn strip_host(incoming: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(incoming.len());

    for (name, value) in incoming {
        if *name != HOST {
            forwarded.append(name.clone(), value.clone());
        }
    }

    forwarded
}

/// Check if a header describes message framing rather than content
pub fn is_framing_header(name: &HeaderName) -> bool {
    FRAMING_HEADERS.contains(name)
}

/// Copy upstream response headers, leaving out `transfer-encoding` and `connection`
///
/// The upstream body is buffered before it is relayed, so its chunked
/// framing no longer applies; the server frames the body itself.
pub fn strip_framing(upstream: &HeaderMap) -> HeaderMap {
    let mut relayed = HeaderMap::with_capacity(upstream.len());

    for (name, value) in upstream {
        if !is_framing_header(name) {
            relayed.append(name.clone(), value.clone());
        }
    }

    relayed
}
