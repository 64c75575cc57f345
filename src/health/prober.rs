//! Active health probing.
//!
//! # Responsibilities
//! - Probe a single endpoint under a short fixed timeout
//! - Probe the whole pool concurrently, at most once per throttle window
//! - Feed every outcome into the registry
//!
//! # Design Decisions
//! - The probe timeout is independent of the dispatch timeout
//! - Probe failures never propagate; they only lower the endpoint's score
//! - The throttle timestamp is taken before probes launch. The round runs while
//!   the throttle lock is held, so overlapping callers wait for it and then
//!   observe the fresh timestamp instead of starting a second round

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{join_all, BoxFuture};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{self, Instant};

use crate::config::HealthConfig;
use crate::health::registry::HealthRegistry;
use crate::observability::metrics;
use crate::selection::Endpoint;

/// Why a probe failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Network or protocol failure.
    #[error("probe request failed: {0}")]
    Request(String),

    /// Endpoint answered with a non-success status.
    #[error("probe returned status {0}")]
    Status(u16),

    /// Endpoint answered but the body was not parseable.
    #[error("probe response not parseable: {0}")]
    Decode(String),

    /// No answer within the probe timeout.
    #[error("probe timed out after {0} ms")]
    Timeout(u64),
}

/// Issues the lightweight read query used to measure an endpoint.
pub trait ProbeTransport: Send + Sync {
    fn probe<'a>(&'a self, endpoint: &'a Endpoint) -> BoxFuture<'a, Result<(), ProbeError>>;
}

/// Result of a [`HealthProber::probe_batch`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// A batch already ran inside the current window; nothing was probed.
    Throttled,
    /// A batch ran.
    Probed { healthy: usize, failed: usize },
}

/// Probes endpoints and records the outcomes.
pub struct HealthProber {
    registry: Arc<HealthRegistry>,
    transport: Arc<dyn ProbeTransport>,
    probe_timeout: Duration,
    window: Duration,
    last_batch_at: Mutex<Option<Instant>>,
}

impl HealthProber {
    pub fn new(
        registry: Arc<HealthRegistry>,
        transport: Arc<dyn ProbeTransport>,
        config: &HealthConfig,
    ) -> Self {
        Self {
            registry,
            transport,
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
            window: Duration::from_secs(config.probe_window_secs),
            last_batch_at: Mutex::new(None),
        }
    }

    /// The registry this prober reports into.
    pub fn registry(&self) -> &Arc<HealthRegistry> {
        &self.registry
    }

    /// Probe one endpoint and record the outcome. Returns true on success.
    pub async fn probe_one(&self, endpoint: &Endpoint) -> bool {
        let start = Instant::now();
        let result = match time::timeout(self.probe_timeout, self.transport.probe(endpoint)).await {
            Ok(inner) => inner,
            Err(_) => Err(ProbeError::Timeout(self.probe_timeout.as_millis() as u64)),
        };

        match result {
            Ok(()) => {
                let latency_ms = start.elapsed().as_millis() as u64;
                self.registry.record_success(endpoint, latency_ms);
                metrics::record_probe(endpoint, true, Some(latency_ms));
                tracing::debug!(endpoint = %endpoint, latency_ms, "Probe succeeded");
                true
            }
            Err(e) => {
                self.registry.record_failure(endpoint);
                metrics::record_probe(endpoint, false, None);
                tracing::warn!(endpoint = %endpoint, error = %e, "Probe failed");
                false
            }
        }
    }

    /// Probe every distinct endpoint concurrently, unless a batch already ran
    /// within the throttle window.
    pub async fn probe_batch(&self, endpoints: &[Endpoint]) -> BatchOutcome {
        let mut last = self.last_batch_at.lock().await;
        let now = Instant::now();
        if let Some(at) = *last {
            if now.saturating_duration_since(at) < self.window {
                tracing::debug!(
                    since_last_secs = now.saturating_duration_since(at).as_secs(),
                    "Probe batch throttled"
                );
                return BatchOutcome::Throttled;
            }
        }
        *last = Some(now);

        let mut seen = HashSet::new();
        let targets: Vec<&Endpoint> = endpoints.iter().filter(|e| seen.insert(*e)).collect();

        tracing::info!(endpoints = targets.len(), "Probe batch starting");
        let results = join_all(targets.iter().map(|ep| self.probe_one(ep))).await;
        drop(last);

        let healthy = results.iter().filter(|ok| **ok).count();
        let failed = results.len() - healthy;
        tracing::info!(healthy, failed, "Probe batch finished");

        BatchOutcome::Probed { healthy, failed }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted transport: per-endpoint delay and verdict.
    #[derive(Default)]
    pub(crate) struct ScriptedProbe {
        pub(crate) behaviour: HashMap<String, (Duration, bool)>,
        pub(crate) calls: AtomicUsize,
    }

    impl ScriptedProbe {
        pub(crate) fn with(mut self, addr: &str, delay_ms: u64, ok: bool) -> Self {
            self.behaviour
                .insert(addr.to_string(), (Duration::from_millis(delay_ms), ok));
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ProbeTransport for ScriptedProbe {
        fn probe<'a>(&'a self, endpoint: &'a Endpoint) -> BoxFuture<'a, Result<(), ProbeError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, ok) = self
                .behaviour
                .get(endpoint.as_str())
                .copied()
                .unwrap_or((Duration::from_millis(10), true));
            Box::pin(async move {
                time::sleep(delay).await;
                if ok {
                    Ok(())
                } else {
                    Err(ProbeError::Status(503))
                }
            })
        }
    }

    fn prober(transport: Arc<ScriptedProbe>) -> HealthProber {
        HealthProber::new(
            Arc::new(HealthRegistry::new()),
            transport,
            &HealthConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_one_records_latency_on_success() {
        let transport = Arc::new(ScriptedProbe::default().with("a", 120, true));
        let prober = prober(transport);
        let ep = Endpoint::new("a");

        assert!(prober.probe_one(&ep).await);
        let stats = prober.registry().get(&ep).unwrap();
        assert_eq!(stats.success_count, 1);
        let latency = *stats.recent_latencies.back().unwrap();
        assert!((120..=121).contains(&latency));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_one_timeout_counts_as_failure() {
        let transport = Arc::new(ScriptedProbe::default().with("slow", 10_000, true));
        let prober = prober(transport);
        let ep = Endpoint::new("slow");

        let start = Instant::now();
        assert!(!prober.probe_one(&ep).await);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(3000) && waited < Duration::from_millis(3100));

        let stats = prober.registry().get(&ep).unwrap();
        assert_eq!(stats.fail_count, 1);
        assert!(stats.recent_latencies.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_runs_concurrently_and_tolerates_failures() {
        let transport = Arc::new(
            ScriptedProbe::default()
                .with("a", 1000, true)
                .with("b", 1000, false)
                .with("c", 1000, true),
        );
        let prober = prober(transport.clone());
        let list: Vec<Endpoint> = ["a", "b", "c"].into_iter().map(Endpoint::new).collect();

        let start = Instant::now();
        let outcome = prober.probe_batch(&list).await;
        assert_eq!(outcome, BatchOutcome::Probed { healthy: 2, failed: 1 });
        assert!(start.elapsed() < Duration::from_millis(1500));
        assert_eq!(transport.calls(), 3);
        assert_eq!(prober.registry().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_batch_within_window_is_throttled() {
        let transport = Arc::new(ScriptedProbe::default());
        let prober = prober(transport.clone());
        let list = vec![Endpoint::new("a"), Endpoint::new("b")];

        prober.probe_batch(&list).await;
        let before = prober.registry().get(&list[0]).unwrap();

        time::advance(Duration::from_secs(9 * 60)).await;
        assert_eq!(prober.probe_batch(&list).await, BatchOutcome::Throttled);
        assert_eq!(transport.calls(), 2);
        assert_eq!(prober.registry().get(&list[0]).unwrap(), before);

        time::advance(Duration::from_secs(61)).await;
        assert!(matches!(prober.probe_batch(&list).await, BatchOutcome::Probed { .. }));
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_batches_share_one_round() {
        let transport = Arc::new(ScriptedProbe::default().with("a", 2000, true));
        let prober = Arc::new(prober(transport.clone()));
        let list = vec![Endpoint::new("a")];

        let first = {
            let prober = prober.clone();
            let list = list.clone();
            tokio::spawn(async move { prober.probe_batch(&list).await })
        };
        tokio::task::yield_now().await;
        let second = prober.probe_batch(&list).await;

        assert_eq!(second, BatchOutcome::Throttled);
        assert!(matches!(first.await.unwrap(), BatchOutcome::Probed { .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_endpoints_probed_once() {
        let transport = Arc::new(ScriptedProbe::default());
        let prober = prober(transport.clone());
        let list = vec![Endpoint::new("a"), Endpoint::new("a")];

        prober.probe_batch(&list).await;
        assert_eq!(transport.calls(), 1);
    }
}
