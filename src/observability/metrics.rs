//! Metrics collection and exposition.
//!
//! # Metrics
//! - `todo_api_requests_total` (counter): requests by method, status
//! - `todo_api_request_duration_seconds` (histogram): latency by method
//! - `todo_api_items` (gauge): items currently in the store

use axum::{extract::Request, middleware::Next, response::Response};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the global Prometheus recorder.
///
/// The returned handle renders the scrape output for `/admin/metrics`.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Prometheus metrics recorder installed");
    Ok(handle)
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "todo_api_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("todo_api_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_item_count(count: usize) {
    gauge!("todo_api_items").set(count as f64);
}

/// Middleware recording every request that reaches the router.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let response = next.run(request).await;

    record_request(&method, response.status().as_u16(), start);
    response
}
