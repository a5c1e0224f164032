//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     ResourceRouter::new("/api")
//!     → register(prefix, controller) for each resource
//!     → into_router() freezes an immutable axum Router
//!
//! Incoming Request (method, path)
//!     → router.rs (collection or item route, method dispatch)
//!     → resource.rs (ResourceController operation)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Controllers are reached through a trait, one concrete type per resource
//! - Deterministic: same input always matches same route

pub mod resource;
pub mod router;

pub use resource::{FieldErrors, Resource, ResourceController};
pub use router::ResourceRouter;
