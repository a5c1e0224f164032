//! The todo resource.
//!
//! # Data Flow
//! ```text
//! HTTP body (JSON)
//!     → model.rs (field validation → TodoChanges)
//!     → controller.rs (ResourceController impl)
//!     → store.rs (DashMap + optional JSON file)
//! ```

pub mod controller;
pub mod model;
pub mod store;

pub use controller::TodoController;
pub use model::{NewTodo, Todo, TodoChanges};
pub use store::{StoreError, TodoStore};
