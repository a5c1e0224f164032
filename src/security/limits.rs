//! Request body limits.
//!
//! Oversized bodies are rejected with 413 Payload Too Large, either up front
//! from `content-length` or while the body is being read.

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::limit::RequestBodyLimitLayer;

/// Cap request bodies at `max_body_size` bytes.
pub fn with_body_limit(router: Router, max_body_size: usize) -> Router {
    router
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_size))
}
