//! CRUD semantics for todo items.

use async_trait::async_trait;
use serde_json::Value;

use crate::http::error::ApiError;
use crate::routing::resource::ResourceController;
use crate::todo::model::{Todo, TodoChanges};
use crate::todo::store::TodoStore;

/// Controller backing `/api/todo/`.
#[derive(Clone)]
pub struct TodoController {
    store: TodoStore,
}

impl TodoController {
    pub fn new(store: TodoStore) -> Self {
        Self { store }
    }

    /// Flush a mutation to the data file, if any.
    ///
    /// The in-memory change stands even when the write fails; the next
    /// successful save picks it up.
    async fn persist(&self) -> Result<(), ApiError> {
        self.store.persist().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to persist todos");
            ApiError::from(e)
        })
    }
}

#[async_trait]
impl ResourceController for TodoController {
    type Item = Todo;

    async fn list(&self) -> Result<Vec<Todo>, ApiError> {
        Ok(self.store.list())
    }

    async fn create(&self, body: Value) -> Result<Todo, ApiError> {
        let changes = TodoChanges::from_json(&body, false).map_err(ApiError::Validation)?;
        let todo = self.store.insert(changes.into_new());
        self.persist().await?;

        tracing::info!(id = todo.id, "Todo created");
        Ok(todo)
    }

    async fn retrieve(&self, id: u64) -> Result<Todo, ApiError> {
        self.store.get(id).ok_or(ApiError::NotFound)
    }

    async fn update(&self, id: u64, body: Value, partial: bool) -> Result<Todo, ApiError> {
        // Missing items win over bad payloads.
        if self.store.get(id).is_none() {
            return Err(ApiError::NotFound);
        }

        let changes = TodoChanges::from_json(&body, partial).map_err(ApiError::Validation)?;
        let todo = self.store.update(id, &changes).ok_or(ApiError::NotFound)?;
        self.persist().await?;

        tracing::info!(id, partial, "Todo updated");
        Ok(todo)
    }

    async fn destroy(&self, id: u64) -> Result<(), ApiError> {
        self.store.remove(id).ok_or(ApiError::NotFound)?;
        self.persist().await?;

        tracing::info!(id, "Todo deleted");
        Ok(())
    }
}
