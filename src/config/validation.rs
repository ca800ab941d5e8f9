//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits and timeouts > 0)
//! - Check that configured filter names exist in the registry
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::imaging::FilterRegistry;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} names unknown filter '{name}'")]
    UnknownFilter { field: &'static str, name: String },

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Validate a configuration against the built-in filter registry.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    validate_with_registry(config, &FilterRegistry::builtin())
}

pub fn validate_with_registry(
    config: &ServerConfig,
    registry: &FilterRegistry,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let positive = [
        ("limits.max_body_bytes", config.limits.max_body_bytes as u64),
        ("limits.max_image_width", config.limits.max_image_width as u64),
        ("limits.max_image_height", config.limits.max_image_height as u64),
        ("limits.max_decode_alloc_bytes", config.limits.max_decode_alloc_bytes),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.processing_secs", config.timeouts.processing_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let filters = [
        ("filters.default_filter", &config.filters.default_filter),
        ("filters.upload_filter", &config.filters.upload_filter),
    ];
    for (field, name) in filters {
        if !registry.contains(name) {
            errors.push(ValidationError::UnknownFilter {
                field,
                name: name.clone(),
            });
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_socket_addr().is_none() {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
