//! Overrides supplied by the hosting environment.
//!
//! Hosts hand over raw strings. Anything absent keeps the current value;
//! anything present but unparseable falls back to the built-in default.

use crate::config::schema::{parse_flag, DispatchConfig, DispatcherConfig};

pub const ENV_ENDPOINTS: &str = "DISPATCH_ENDPOINTS";
pub const ENV_TIMEOUT_MS: &str = "DISPATCH_TIMEOUT_MS";
pub const ENV_RETRY_COUNT: &str = "DISPATCH_RETRY_COUNT";
pub const ENV_HEALTH_CHECK: &str = "DISPATCH_HEALTH_CHECK";

/// Apply overrides read through `lookup` (normally `std::env::var`).
pub fn apply_env_overrides<F>(config: &mut DispatcherConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = DispatchConfig::default();

    if let Some(endpoints) = lookup(ENV_ENDPOINTS) {
        config.endpoints = endpoints;
    }
    if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
        config.dispatch.timeout_ms = raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(value = %raw, "Unparseable {}, using default", ENV_TIMEOUT_MS);
            defaults.timeout_ms
        });
    }
    if let Some(raw) = lookup(ENV_RETRY_COUNT) {
        config.dispatch.retry_count = raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(value = %raw, "Unparseable {}, using default", ENV_RETRY_COUNT);
            defaults.retry_count
        });
    }
    if let Some(raw) = lookup(ENV_HEALTH_CHECK) {
        config.dispatch.health_check_enabled = parse_flag(&raw).unwrap_or_else(|| {
            tracing::warn!(value = %raw, "Unparseable {}, using default", ENV_HEALTH_CHECK);
            defaults.health_check_enabled
        });
    }
}
