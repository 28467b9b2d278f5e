//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate path shapes (leading slash, no trailing slash on prefixes)
//! - Detect prefixes that would shadow each other
//! - Validate addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: must start with '/' (got {value:?})")]
    MissingLeadingSlash { field: &'static str, value: String },

    #[error("{field}: must not end with '/' (got {value:?})")]
    TrailingSlash { field: &'static str, value: String },

    #[error("{field}: {value:?} collides with a reserved path")]
    ReservedPath { field: &'static str, value: String },

    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: {value:?} is not a valid header name")]
    InvalidHeaderName { field: &'static str, value: String },

    #[error("{field}: must not be empty")]
    Empty { field: &'static str },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },
}

const API_PREFIX: &str = "/api";

/// Validate a loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_prefix(&mut errors, "monitoring.path_prefix", &config.monitoring.path_prefix);
    check_path(&mut errors, "health.path", &config.health.path);

    for (field, value) in [
        ("monitoring.path_prefix", &config.monitoring.path_prefix),
        ("health.path", &config.health.path),
    ] {
        if value == API_PREFIX || value.starts_with("/api/") {
            errors.push(ValidationError::ReservedPath {
                field,
                value: value.clone(),
            });
        }
    }
    if config.health.path == config.monitoring.path_prefix
        || config
            .health
            .path
            .starts_with(&format!("{}/", config.monitoring.path_prefix))
    {
        errors.push(ValidationError::ReservedPath {
            field: "health.path",
            value: config.health.path.clone(),
        });
    }

    if config.api.version.is_empty() {
        errors.push(ValidationError::Empty { field: "api.version" });
    } else if config.api.version.contains('/') {
        errors.push(ValidationError::ReservedPath {
            field: "api.version",
            value: config.api.version.clone(),
        });
    }
    if config.api.namespace_header.is_empty() {
        errors.push(ValidationError::Empty {
            field: "api.namespace_header",
        });
    } else if HeaderName::from_bytes(config.api.namespace_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName {
            field: "api.namespace_header",
            value: config.api.namespace_header.clone(),
        });
    }

    if config.monitoring.upstream_host.is_empty() {
        errors.push(ValidationError::Empty {
            field: "monitoring.upstream_host",
        });
    }
    if config.monitoring.upstream_port == 0 {
        errors.push(ValidationError::Zero {
            field: "monitoring.upstream_port",
        });
    }
    if config.monitoring.timeout_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "monitoring.timeout_secs",
        });
    }
    if config.startup.initialize_attempts == 0 {
        errors.push(ValidationError::Zero {
            field: "startup.initialize_attempts",
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "timeouts.request_secs",
        });
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_path(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.is_empty() {
        errors.push(ValidationError::Empty { field });
    } else if !value.starts_with('/') {
        errors.push(ValidationError::MissingLeadingSlash {
            field,
            value: value.to_string(),
        });
    }
}

fn check_prefix(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    check_path(errors, field, value);
    if value.ends_with('/') {
        errors.push(ValidationError::TrailingSlash {
            field,
            value: value.to_string(),
        });
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
