//! Cross-origin access for browser clients.
//!
//! A browser frontend served from another origin sends a preflight `OPTIONS`
//! before every JSON write. `CorsLayer` answers it before routing, so the
//! resource routes never see `OPTIONS`.

use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::http::X_REQUEST_ID;

/// Build the CORS layer for `origins`, or `None` when the list is empty.
///
/// Entries that are not valid header values are skipped; config validation
/// rejects them before this point.
pub fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let list: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();
        AllowOrigin::list(list)
    };

    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .expose_headers([header::LOCATION, HeaderName::from_static(X_REQUEST_ID)]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn app(origins: &[&str]) -> Router {
        let origins: Vec<String> = origins.iter().map(|o| o.to_string()).collect();
        let router = Router::new().route("/items/", get(|| async { "[]" }).post(|| async { "{}" }));
        match cors_layer(&origins) {
            Some(cors) => router.layer(cors),
            None => router,
        }
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/items/")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_preflight_any_origin() {
        let response = app(&["*"]).oneshot(preflight("http://localhost:3000")).await.unwrap();
        assert!(response.status().is_success());
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap();
        assert!(methods.contains("POST") && methods.contains("PATCH"));
    }

    #[tokio::test]
    async fn test_listed_origin_only() {
        let app = app(&["http://localhost:3000"]);

        let response = app.clone().oneshot(preflight("http://localhost:3000")).await.unwrap();
        assert!(response.status().is_success());
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );

        let response = app.oneshot(preflight("http://evil.test")).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_empty_list_disables_cors() {
        assert!(cors_layer(&[]).is_none());
        let response = app(&[]).oneshot(preflight("http://localhost:3000")).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
