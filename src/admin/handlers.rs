use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn get_stats(State(state): State<AppState>) -> Json<TodoStats> {
    let (total, completed) = state.store.counts();
    Json(TodoStats {
        total,
        completed,
        pending: total - completed,
    })
}

pub async fn get_metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let handle = state.metrics.as_ref().ok_or(ApiError::NotFound)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}

pub async fn flush_store(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    if !state.store.is_persistent() {
        return Err(ApiError::Conflict("No data file is configured.".to_string()));
    }
    state.store.save().await?;
    tracing::info!("Store flushed by admin request");
    Ok(StatusCode::NO_CONTENT)
}
