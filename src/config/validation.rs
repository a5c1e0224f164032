//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check referenced files exist
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{AppConfig, RootMode};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("admin.api_key must not be empty when the admin interface is enabled")]
    EmptyAdminKey,

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),

    #[error("root.landing_page '{0}' does not exist")]
    MissingLandingPage(String),

    #[error("security.cors_origins entry '{0}' is not an origin like https://example.com")]
    InvalidCorsOrigin(String),

    #[error("security.cors_origins cannot mix \"*\" with explicit origins")]
    MixedCorsWildcard,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::EmptyAdminKey);
    }

    let level = config.observability.log_level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    let origins = &config.security.cors_origins;
    if origins.len() > 1 && origins.iter().any(|o| o == "*") {
        errors.push(ValidationError::MixedCorsWildcard);
    }
    for origin in origins.iter().filter(|o| *o != "*") {
        if !is_origin(origin) {
            errors.push(ValidationError::InvalidCorsOrigin(origin.clone()));
        }
    }

    // The page is only read in landing mode; a stale path is harmless otherwise.
    if config.root.mode == RootMode::Landing {
        if let Some(page) = &config.root.landing_page {
            if !Path::new(page).is_file() {
                errors.push(ValidationError::MissingLandingPage(page.clone()));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Scheme and authority only: no path, no trailing slash.
fn is_origin(value: &str) -> bool {
    let authority = value
        .strip_prefix("http://")
        .or_else(|| value.strip_prefix("https://"));
    match authority {
        Some(authority) => {
            !authority.is_empty()
                && !authority.contains('/')
                && HeaderValue::from_str(value).is_ok()
        }
        None => false,
    }
}
