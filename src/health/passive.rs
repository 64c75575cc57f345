//! Passive health feedback from dispatch attempts.
//!
//! # Design Decisions
//! - Off by default: scores then come from probes alone
//! - Timeouts and request errors both count as failures
//! - Only successful attempts contribute latency

use std::sync::Arc;
use std::time::Duration;

use crate::health::registry::HealthRegistry;
use crate::selection::Endpoint;

/// Reports attempt outcomes into the registry when enabled.
#[derive(Debug, Clone)]
pub struct PassiveRecorder {
    registry: Arc<HealthRegistry>,
    enabled: bool,
}

impl PassiveRecorder {
    pub fn new(registry: Arc<HealthRegistry>, enabled: bool) -> Self {
        Self { registry, enabled }
    }

    pub fn success(&self, endpoint: &Endpoint, elapsed: Duration) {
        if self.enabled {
            self.registry
                .record_success(endpoint, elapsed.as_millis() as u64);
        }
    }

    pub fn failure(&self, endpoint: &Endpoint) {
        if self.enabled {
            self.registry.record_failure(endpoint);
        }
    }
}
