//! Resource controller interface.
//!
//! A controller owns the CRUD semantics of one resource type. The router
//! only knows this trait; it never looks inside the items it serves.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::http::error::ApiError;

/// Validation messages keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// An item with a stable integer identifier.
pub trait Resource {
    fn id(&self) -> u64;
}

/// CRUD operations over a single resource type.
///
/// Request bodies arrive as parsed JSON so each controller can report
/// field-level validation failures in its own terms.
#[async_trait]
pub trait ResourceController: Send + Sync + 'static {
    type Item: Resource + Serialize + Send + 'static;

    /// Every item, in a stable order.
    async fn list(&self) -> Result<Vec<Self::Item>, ApiError>;

    async fn create(&self, body: Value) -> Result<Self::Item, ApiError>;

    /// Fails with [`ApiError::NotFound`] when no item has this id.
    async fn retrieve(&self, id: u64) -> Result<Self::Item, ApiError>;

    /// Replace (`partial == false`) or patch (`partial == true`) an item.
    async fn update(&self, id: u64, body: Value, partial: bool) -> Result<Self::Item, ApiError>;

    async fn destroy(&self, id: u64) -> Result<(), ApiError>;
}
