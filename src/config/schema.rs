//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dispatcher.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::selection::{parse_endpoint_list, Endpoint};

/// Root configuration for the dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Newline-separated endpoint addresses, in preference order.
    pub endpoints: String,

    /// Per-call dispatch settings.
    pub dispatch: DispatchConfig,

    /// Probing, scoring and eviction settings.
    pub health: HealthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl DispatcherConfig {
    /// The parsed endpoint list.
    pub fn endpoint_list(&self) -> Vec<Endpoint> {
        parse_endpoint_list(&self.endpoints)
    }
}

pub const DEFAULT_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_RETRY_COUNT: u32 = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Per-call dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Deadline for a single attempt in milliseconds.
    pub timeout_ms: u64,

    /// Retries per endpoint after the first attempt.
    pub retry_count: u32,

    /// Refresh and use health scores when ordering endpoints.
    pub health_check_enabled: bool,

    /// Fixed pause between attempts on the same endpoint.
    pub retry_delay_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry_count: DEFAULT_RETRY_COUNT,
            health_check_enabled: true,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl DispatchConfig {
    /// Build from raw host-supplied strings.
    ///
    /// Absent, unparseable or zero timeouts fall back to their defaults.
    pub fn from_raw(
        timeout_ms: Option<&str>,
        retry_count: Option<&str>,
        health_check_enabled: Option<&str>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            timeout_ms: timeout_ms
                .and_then(|v| v.trim().parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.timeout_ms),
            retry_count: retry_count
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.retry_count),
            health_check_enabled: health_check_enabled
                .and_then(parse_flag)
                .unwrap_or(defaults.health_check_enabled),
            retry_delay_ms: defaults.retry_delay_ms,
        }
    }
}

/// Parse a boolean flag the way hosts tend to spell them.
pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Health probing configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HealthConfig {
    /// Probe timeout in milliseconds (independent of the dispatch timeout).
    pub probe_timeout_ms: u64,

    /// Path appended to an endpoint for probe requests.
    pub probe_path: String,

    /// Minimum seconds between two pool-wide probe batches.
    pub probe_window_secs: u64,

    /// Entries not checked for this many seconds are evicted.
    pub stale_after_secs: u64,

    /// How often the janitor sweeps the registry.
    pub janitor_interval_secs: u64,

    /// Feed dispatch attempt outcomes into the registry as well.
    pub record_request_outcomes: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 3000,
            probe_path: "/".to_string(),
            probe_window_secs: 10 * 60,
            stale_after_secs: 30 * 60,
            janitor_interval_secs: 60,
            record_request_outcomes: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9464".to_string(),
        }
    }
}
