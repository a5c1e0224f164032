//! The `/` route.
//!
//! The mode is fixed when the router is built, so a running server either
//! always serves the landing page or always redirects.

use axum::{
    body::Bytes,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use std::fs;

use crate::config::{RootConfig, RootMode};

/// Where the root redirect points.
pub const API_ROOT: &str = "/api/";

const DEFAULT_LANDING_PAGE: &str = include_str!("../../static/index.html");

/// Build the router for `/` according to `config`.
///
/// In landing mode a configured page is read once, here.
pub fn root_router(config: &RootConfig) -> std::io::Result<Router> {
    let router = match config.mode {
        RootMode::Landing => {
            let page = match &config.landing_page {
                Some(path) => Bytes::from(fs::read(path)?),
                None => Bytes::from_static(DEFAULT_LANDING_PAGE.as_bytes()),
            };
            Router::new().route("/", get(move || landing_page(page)))
        }
        RootMode::Redirect => Router::new().route("/", get(redirect_to_api)),
    };
    Ok(router)
}

async fn landing_page(page: Bytes) -> Html<Bytes> {
    Html(page)
}

/// 302 Found; the target may move, so clients must not cache it.
async fn redirect_to_api() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, API_ROOT)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get_root(config: &RootConfig) -> axum::response::Response {
        root_router(config)
            .unwrap()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_builtin_landing_page() {
        let response = get_root(&RootConfig::default()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("/api/"));
    }

    #[tokio::test]
    async fn test_custom_landing_page() {
        let path = std::env::temp_dir().join(format!("landing-{}.html", uuid::Uuid::new_v4()));
        fs::write(&path, "<h1>hello</h1>").unwrap();

        let config = RootConfig {
            mode: RootMode::Landing,
            landing_page: Some(path.to_string_lossy().into_owned()),
        };
        let response = get_root(&config).await;
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>hello</h1>");

        fs::remove_file(&path).unwrap_or_default();
    }

    #[tokio::test]
    async fn test_redirect_mode() {
        let config = RootConfig {
            mode: RootMode::Redirect,
            landing_page: None,
        };
        let response = get_root(&config).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/api/");
    }

    #[test]
    fn test_missing_landing_page() {
        let config = RootConfig {
            mode: RootMode::Landing,
            landing_page: Some("/no/such/page.html".into()),
        };
        assert!(root_router(&config).is_err());
    }
}
