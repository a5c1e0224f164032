//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (answer preflights, tag cross-origin responses)
//!     → limits.rs (reject oversized bodies with 413)
//!     → Pass to routing
//! Outgoing response:
//!     → headers.rs (add hardening headers)
//! ```
//!
//! # Design Decisions
//! - Fail closed: oversized requests never reach a controller
//! - No trust in client input

pub mod cors;
pub mod headers;
pub mod limits;
