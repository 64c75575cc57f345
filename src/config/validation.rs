//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, bounded retries)
//! - Check addresses that must parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - An empty endpoint list is valid here; dispatch reports it per call

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::DispatcherConfig;

/// Upper bound on retries per endpoint.
pub const MAX_RETRY_COUNT: u32 = 10;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("dispatch.retry_count {0} exceeds maximum of 10")]
    TooManyRetries(u32),

    #[error("health.probe_path must start with '/': {0:?}")]
    ProbePath(String),

    #[error("observability.metrics_address is not a socket address: {0:?}")]
    MetricsAddress(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &DispatcherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let positive = [
        ("dispatch.timeout_ms", config.dispatch.timeout_ms),
        ("health.probe_timeout_ms", config.health.probe_timeout_ms),
        ("health.stale_after_secs", config.health.stale_after_secs),
        ("health.janitor_interval_secs", config.health.janitor_interval_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if config.dispatch.retry_count > MAX_RETRY_COUNT {
        errors.push(ValidationError::TooManyRetries(config.dispatch.retry_count));
    }

    if !config.health.probe_path.starts_with('/') {
        errors.push(ValidationError::ProbePath(config.health.probe_path.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
