//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, trace span)
//!     → root.rs | routing (/api/) | admin (/admin/)
//!     → error.rs (failures rendered as JSON)
//!     → Send to client
//! ```

pub mod error;
pub mod request;
pub mod root;
pub mod server;

pub use error::ApiError;
pub use request::X_REQUEST_ID;
pub use server::{build_app, AppState, HttpServer, ServerError};
