//! Request identification and tracing spans.
//!
//! Every request carries an `x-request-id`: the client's own value when it
//! sent one, otherwise a fresh UUID v4. The id is echoed on the response and
//! recorded on the request span.

use axum::{body::Body, http::Request};
use tracing::Span;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request id of `request`, or `"unknown"` before one has been assigned.
pub fn request_id(request: &Request<Body>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span for `TraceLayer`.
pub fn make_request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request_id(request),
        method = %request.method(),
        path = %request.uri().path(),
    )
}
