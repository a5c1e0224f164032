//! HTTP-facing error type.
//!
//! Every handler returns `Result<_, ApiError>`; the body is always JSON,
//! either `{"detail": "..."}` or a map of field name to messages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::routing::resource::FieldErrors;
use crate::todo::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found.")]
    NotFound,

    #[error("JSON parse error - {0}")]
    MalformedJson(String),

    #[error("Invalid input.")]
    Validation(FieldErrors),

    #[error("Authentication credentials were not provided or are invalid.")]
    Unauthorized,

    #[error("{0}")]
    Conflict(String),

    #[error("A server error occurred.")]
    Storage(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MalformedJson(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();
        match self {
            ApiError::Validation(errors) => (status, Json(errors)).into_response(),
            ApiError::Storage(e) => {
                // Internal detail stays in the log.
                tracing::error!(error = %e, "Request failed with a storage error");
                (status, Json(json!({ "detail": detail }))).into_response()
            }
            _ => (status, Json(json!({ "detail": detail }))).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, body) = body_json(ApiError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Not found."}));
    }

    #[tokio::test]
    async fn test_validation_body_is_field_map() {
        let mut errors = FieldErrors::new();
        errors.insert("title".into(), vec!["This field is required.".into()]);
        let (status, body) = body_json(ApiError::Validation(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"title": ["This field is required."]}));
    }

    #[tokio::test]
    async fn test_storage_error_hides_detail() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "/var/secret");
        let (status, body) = body_json(ApiError::from(StoreError::from(io))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"detail": "A server error occurred."}));
    }
}
