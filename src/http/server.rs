//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Load the store and build the route table
//! - Compose `/`, `/api/` and `/admin/` into one Axum router
//! - Wire up middleware (request ID, tracing, timeout, CORS, limits, headers, metrics)
//! - Serve until shutdown, then flush the store

use axum::{middleware, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::AppConfig;
use crate::http::error::ApiError;
use crate::http::request::make_request_span;
use crate::http::root::root_router;
use crate::observability::metrics::track_metrics;
use crate::routing::ResourceRouter;
use crate::security::{
    cors::cors_layer, headers::with_security_headers, limits::with_body_limit,
};
use crate::todo::{StoreError, TodoController, TodoStore};

/// Mount point of the resource routes.
pub const API_PREFIX: &str = "/api";

/// Errors that stop the server from starting or finishing cleanly.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to open the todo store: {0}")]
    Store(#[from] StoreError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: TodoStore,
    /// Present when the Prometheus recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// HTTP server for the todo API.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a server without a metrics exporter.
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        Self::with_metrics(config, None)
    }

    /// Create a server whose `/admin/metrics` renders from `metrics`.
    pub fn with_metrics(
        config: AppConfig,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self, ServerError> {
        let store = match &config.storage.data_file {
            Some(path) => TodoStore::load_from_file(path)?,
            None => TodoStore::default(),
        };

        let state = AppState {
            config: Arc::new(config),
            store,
            metrics,
        };
        let router = build_app(state.clone())?;

        Ok(Self { router, state })
    }

    /// A handle to the full router, e.g. for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn store(&self) -> &TodoStore {
        &self.state.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.config
    }

    /// Serve on `listener` until `shutdown` fires, then save the store.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        if self.state.store.is_persistent() {
            self.state.store.save().await?;
            tracing::info!("Store saved");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the application router with all middleware layers.
///
/// ```text
/// /            landing page or redirect (root.mode)
/// /api/...     resource routes
/// /admin/...   admin interface (admin.enabled)
/// *            404
/// ```
#[allow(deprecated)]
pub fn build_app(state: AppState) -> Result<Router, ServerError> {
    let config = Arc::clone(&state.config);

    let todos = Arc::new(TodoController::new(state.store.clone()));
    let api = ResourceRouter::new(API_PREFIX)
        .register("todo", todos)
        .into_router();

    let mut app = root_router(&config.root)?.merge(api);

    if config.admin.enabled {
        app = app.merge(setup_admin_router(state));
    }

    app = app
        .fallback(not_found)
        .layer(middleware::from_fn(track_metrics));

    app = with_body_limit(app, config.security.max_body_size);

    if config.security.enable_headers {
        app = with_security_headers(app);
    }

    if let Some(cors) = cors_layer(&config.security.cors_origins) {
        app = app.layer(cors);
    }

    let app = app.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            ))),
    );

    tracing::debug!(
        root_mode = ?config.root.mode,
        admin_enabled = config.admin.enabled,
        "Router built"
    );

    Ok(app)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RootMode;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn state(config: AppConfig) -> AppState {
        AppState {
            config: Arc::new(config),
            store: TodoStore::default(),
            metrics: None,
        }
    }

    fn admin_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.admin.enabled = true;
        config.admin.api_key = "secret".into();
        config
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn admin_get(uri: &str, key: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {key}"))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_path_is_json_404() {
        let app = build_app(state(AppConfig::default())).unwrap();
        let (status, body) = call(&app, get("/nowhere")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Not found."}));
    }

    #[tokio::test]
    async fn test_request_id_generated_and_propagated() {
        let app = build_app(state(AppConfig::default())).unwrap();

        let response = app.clone().oneshot(get("/api/")).await.unwrap();
        let generated = response.headers()["x-request-id"].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(generated).is_ok());

        let request = Request::builder()
            .uri("/api/")
            .header("x-request-id", "client-id-1")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "client-id-1");
    }

    #[tokio::test]
    async fn test_security_headers_toggle() {
        let app = build_app(state(AppConfig::default())).unwrap();
        let response = app.oneshot(get("/api/")).await.unwrap();
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

        let mut config = AppConfig::default();
        config.security.enable_headers = false;
        let app = build_app(state(config)).unwrap();
        let response = app.oneshot(get("/api/")).await.unwrap();
        assert!(response.headers().get(header::X_CONTENT_TYPE_OPTIONS).is_none());
    }

    #[tokio::test]
    async fn test_cross_origin_preflight() {
        let app = build_app(state(AppConfig::default())).unwrap();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/todo/")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert!(response.status().is_success(), "{}", response.status());
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let request = Request::builder()
            .uri("/api/todo/")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_cors_disabled() {
        let mut config = AppConfig::default();
        config.security.cors_origins = Vec::new();
        let app = build_app(state(config)).unwrap();
        let request = Request::builder()
            .uri("/api/todo/")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_root_redirect_mode() {
        let mut config = AppConfig::default();
        config.root.mode = RootMode::Redirect;
        let app = build_app(state(config)).unwrap();
        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/api/");
    }

    #[tokio::test]
    async fn test_admin_disabled_is_404() {
        let app = build_app(state(AppConfig::default())).unwrap();
        let (status, _) = call(&app, admin_get("/admin/status", "CHANGE_ME_IN_PRODUCTION")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_auth() {
        let app = build_app(state(admin_config())).unwrap();

        let (status, _) = call(&app, get("/admin/status")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app, admin_get("/admin/status", "wrong")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(&app, admin_get("/admin/", "secret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "operational");
    }

    #[tokio::test]
    async fn test_admin_stats() {
        let state = state(admin_config());
        let app = build_app(state.clone()).unwrap();

        for (title, completed) in [("a", true), ("b", false), ("c", false)] {
            let request = Request::builder()
                .method(Method::POST)
                .uri("/api/todo/")
                .body(Body::from(json!({"title": title, "completed": completed}).to_string()))
                .unwrap();
            let (status, _) = call(&app, request).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = call(&app, admin_get("/admin/stats", "secret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"total": 3, "completed": 1, "pending": 2}));
    }

    #[tokio::test]
    async fn test_admin_flush_without_data_file() {
        let app = build_app(state(admin_config())).unwrap();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/admin/flush")
            .header(header::AUTHORIZATION, "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(&app, request).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_admin_metrics() {
        let app = build_app(state(admin_config())).unwrap();
        let (status, _) = call(&app, admin_get("/admin/metrics", "secret")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let mut with_metrics = state(admin_config());
        with_metrics.metrics = Some(recorder.handle());
        let app = build_app(with_metrics).unwrap();
        let response = app.oneshot(admin_get("/admin/metrics", "secret")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }
}
