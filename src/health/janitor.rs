//! Periodic eviction of stale registry entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::HealthConfig;
use crate::health::registry::HealthRegistry;
use crate::observability::metrics;
use crate::selection::Endpoint;

/// Sweeps the registry for entries not checked within `stale_after`.
pub struct RegistryJanitor {
    registry: Arc<HealthRegistry>,
    stale_after: Duration,
    interval: Duration,
}

impl RegistryJanitor {
    pub fn new(registry: Arc<HealthRegistry>, config: &HealthConfig) -> Self {
        Self {
            registry,
            stale_after: Duration::from_secs(config.stale_after_secs),
            interval: Duration::from_secs(config.janitor_interval_secs),
        }
    }

    /// Evict stale entries once. Returns what was removed.
    pub fn sweep(&self) -> Vec<Endpoint> {
        let evicted = self.registry.evict_stale(self.stale_after, Instant::now());
        if !evicted.is_empty() {
            metrics::record_evictions(evicted.len());
            for endpoint in &evicted {
                tracing::info!(endpoint = %endpoint, "Evicted stale endpoint stats");
            }
        }
        evicted
    }

    /// Sweep on a fixed interval until shutdown is signalled.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            stale_after_secs = self.stale_after.as_secs(),
            "Registry janitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Registry janitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::score::NEUTRAL_SCORE;

    #[tokio::test(start_paused = true)]
    async fn test_entry_older_than_thirty_minutes_is_evicted() {
        let registry = Arc::new(HealthRegistry::new());
        let janitor = RegistryJanitor::new(registry.clone(), &HealthConfig::default());
        let ep = Endpoint::new("http://a");

        registry.record_success(&ep, 40);
        assert!(registry.score(&ep) > NEUTRAL_SCORE);

        time::advance(Duration::from_secs(29 * 60)).await;
        assert!(janitor.sweep().is_empty());

        time::advance(Duration::from_secs(2 * 60)).await;
        assert_eq!(janitor.sweep(), vec![ep.clone()]);
        assert!(registry.get(&ep).is_none());
        assert_eq!(registry.score(&ep), NEUTRAL_SCORE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let registry = Arc::new(HealthRegistry::new());
        let ep = Endpoint::new("http://a");
        registry.record_failure(&ep);

        let janitor = RegistryJanitor::new(registry.clone(), &HealthConfig::default());
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(janitor.run(rx));

        time::sleep(Duration::from_secs(31 * 60 + 60)).await;
        assert!(registry.is_empty());

        tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
