//! In-memory store of per-endpoint health statistics.
//!
//! # Responsibilities
//! - Record probe (and optionally request) outcomes per endpoint
//! - Hand out point-in-time copies of an endpoint's stats
//! - Evict entries that have not been checked recently
//!
//! # Design Decisions
//! - Entries are created lazily on the first recorded outcome
//! - Each update runs under the map's shard lock for that key, so counters and
//!   the latency window of one endpoint are always mutated together
//! - The registry is an owned value shared via `Arc`, never a process global

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::time::Instant;

use crate::health::score;
use crate::observability::metrics;
use crate::selection::Endpoint;

/// Number of successful latencies kept per endpoint.
pub const LATENCY_WINDOW: usize = 10;

/// Observed statistics for one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointStats {
    /// Successful outcomes recorded so far.
    pub success_count: u64,
    /// Failed outcomes recorded so far.
    pub fail_count: u64,
    /// Latencies (ms) of the most recent successes, oldest first.
    pub recent_latencies: VecDeque<u64>,
    /// When the last outcome (success or failure) was recorded.
    pub last_checked_at: Instant,
}

impl EndpointStats {
    fn new(now: Instant) -> Self {
        Self {
            success_count: 0,
            fail_count: 0,
            recent_latencies: VecDeque::with_capacity(LATENCY_WINDOW + 1),
            last_checked_at: now,
        }
    }

    /// Total recorded outcomes.
    pub fn total(&self) -> u64 {
        self.success_count + self.fail_count
    }

    /// Mean of the latency window, if any success has been recorded.
    pub fn average_latency_ms(&self) -> Option<f64> {
        if self.recent_latencies.is_empty() {
            return None;
        }
        let sum: u64 = self.recent_latencies.iter().sum();
        Some(sum as f64 / self.recent_latencies.len() as f64)
    }

    fn push_latency(&mut self, latency_ms: u64) {
        self.recent_latencies.push_back(latency_ms);
        while self.recent_latencies.len() > LATENCY_WINDOW {
            self.recent_latencies.pop_front();
        }
    }
}

/// Serializable view of one endpoint, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointReport {
    pub endpoint: Endpoint,
    pub success_count: u64,
    pub fail_count: u64,
    pub average_latency_ms: Option<f64>,
    pub last_checked_secs_ago: u64,
    pub score: f64,
}

/// Thread-safe registry of endpoint statistics.
#[derive(Debug, Default)]
pub struct HealthRegistry {
    entries: DashMap<Endpoint, EndpointStats>,
}

impl HealthRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful outcome with its latency.
    pub fn record_success(&self, endpoint: &Endpoint, latency_ms: u64) {
        self.record_success_at(endpoint, latency_ms, Instant::now());
    }

    /// Record a successful outcome observed at `at`.
    pub fn record_success_at(&self, endpoint: &Endpoint, latency_ms: u64, at: Instant) {
        let created = !self.entries.contains_key(endpoint);
        {
            let mut stats = self
                .entries
                .entry(endpoint.clone())
                .or_insert_with(|| EndpointStats::new(at));
            stats.success_count += 1;
            stats.push_latency(latency_ms);
            stats.last_checked_at = at;
        }
        if created {
            metrics::record_registry_size(self.entries.len());
        }
    }

    /// Record a failed outcome. No latency is kept for failures.
    pub fn record_failure(&self, endpoint: &Endpoint) {
        self.record_failure_at(endpoint, Instant::now());
    }

    /// Record a failed outcome observed at `at`.
    pub fn record_failure_at(&self, endpoint: &Endpoint, at: Instant) {
        let created = !self.entries.contains_key(endpoint);
        {
            let mut stats = self
                .entries
                .entry(endpoint.clone())
                .or_insert_with(|| EndpointStats::new(at));
            stats.fail_count += 1;
            stats.last_checked_at = at;
        }
        if created {
            metrics::record_registry_size(self.entries.len());
        }
    }

    /// Copy of the stats for `endpoint`, if it has ever been observed.
    pub fn get(&self, endpoint: &Endpoint) -> Option<EndpointStats> {
        self.entries.get(endpoint).map(|r| r.value().clone())
    }

    /// Remove the entry for `endpoint`. Returns true if one existed.
    pub fn evict(&self, endpoint: &Endpoint) -> bool {
        let removed = self.entries.remove(endpoint).is_some();
        if removed {
            metrics::record_registry_size(self.entries.len());
        }
        removed
    }

    /// Remove every entry not checked within `max_age` of `now`.
    ///
    /// Returns the evicted endpoints.
    pub fn evict_stale(&self, max_age: Duration, now: Instant) -> Vec<Endpoint> {
        let mut evicted = Vec::new();
        self.entries.retain(|endpoint, stats| {
            let stale = now.saturating_duration_since(stats.last_checked_at) > max_age;
            if stale {
                evicted.push(endpoint.clone());
            }
            !stale
        });
        if !evicted.is_empty() {
            metrics::record_registry_size(self.entries.len());
        }
        evicted
    }

    /// Every endpoint that currently has an entry.
    pub fn all_known(&self) -> HashSet<Endpoint> {
        self.entries.iter().map(|r| r.key().clone()).collect()
    }

    /// Number of tracked endpoints.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no endpoint has been observed (cold start).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Score of `endpoint` as of now. Unknown endpoints score neutral.
    pub fn score(&self, endpoint: &Endpoint) -> f64 {
        self.score_at(endpoint, Instant::now())
    }

    /// Score of `endpoint` as of `now`.
    pub fn score_at(&self, endpoint: &Endpoint, now: Instant) -> f64 {
        match self.entries.get(endpoint) {
            Some(stats) => score::score(Some(stats.value()), now),
            None => score::score(None, now),
        }
    }

    /// Report every tracked endpoint, best score first.
    pub fn snapshot(&self, now: Instant) -> Vec<EndpointReport> {
        let mut reports: Vec<EndpointReport> = self
            .entries
            .iter()
            .map(|r| {
                let stats = r.value();
                EndpointReport {
                    endpoint: r.key().clone(),
                    success_count: stats.success_count,
                    fail_count: stats.fail_count,
                    average_latency_ms: stats.average_latency_ms(),
                    last_checked_secs_ago: now
                        .saturating_duration_since(stats.last_checked_at)
                        .as_secs(),
                    score: score::score(Some(stats), now),
                }
            })
            .collect();
        reports.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.endpoint.cmp(&b.endpoint))
        });
        reports
    }
}
