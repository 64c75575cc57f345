//! Score-ordered endpoint selection.
//!
//! # Responsibilities
//! - Refresh health data (throttled) before ordering
//! - Order the configured endpoints best score first
//! - Split the order into a primary pick and a fallback sequence
//!
//! # Design Decisions
//! - Cold start (empty registry) keeps the configured order and names no primary
//! - Sorting is stable, so equal scores keep their configured order
//! - Every occurrence of the primary is removed from the fallbacks

use std::sync::Arc;
use tokio::time::Instant;

use crate::health::{HealthProber, HealthRegistry};
use crate::observability::metrics;
use crate::selection::endpoint::{parse_endpoint_list, Endpoint};

/// Ordered dispatch plan for one call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    /// Best-scored endpoint, absent on cold start.
    pub primary: Option<Endpoint>,
    /// Remaining endpoints in the order they should be tried.
    pub fallbacks: Vec<Endpoint>,
}

impl Selection {
    /// Every endpoint in the order it will be tried.
    pub fn attempt_order(&self) -> impl Iterator<Item = &Endpoint> {
        self.primary.iter().chain(self.fallbacks.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.fallbacks.is_empty()
    }
}

/// Orders endpoints using registry scores.
pub struct Selector {
    registry: Arc<HealthRegistry>,
    prober: Arc<HealthProber>,
}

impl Selector {
    pub fn new(registry: Arc<HealthRegistry>, prober: Arc<HealthProber>) -> Self {
        Self { registry, prober }
    }

    pub fn registry(&self) -> &Arc<HealthRegistry> {
        &self.registry
    }

    pub fn prober(&self) -> &Arc<HealthProber> {
        &self.prober
    }

    /// Parse `endpoint_list` and order it.
    pub async fn select_order(&self, endpoint_list: &str, health_check_enabled: bool) -> Selection {
        let endpoints = parse_endpoint_list(endpoint_list);
        self.order(&endpoints, health_check_enabled).await
    }

    /// Order already-parsed endpoints.
    pub async fn order(&self, endpoints: &[Endpoint], health_check_enabled: bool) -> Selection {
        if endpoints.is_empty() {
            return Selection::default();
        }

        if health_check_enabled {
            self.prober.probe_batch(endpoints).await;
        }

        if self.registry.is_empty() {
            tracing::debug!(
                endpoints = endpoints.len(),
                "No health data yet, using configured order"
            );
            return Selection {
                primary: None,
                fallbacks: endpoints.to_vec(),
            };
        }

        let now = Instant::now();
        let mut scored: Vec<(Endpoint, f64)> = endpoints
            .iter()
            .map(|ep| (ep.clone(), self.registry.score_at(ep, now)))
            .collect();
        // sort_by is stable: ties keep configured order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        for (endpoint, score) in &scored {
            metrics::record_score(endpoint, *score);
        }

        let mut ordered = scored.into_iter().map(|(ep, _)| ep);
        let primary = ordered.next();
        let fallbacks: Vec<Endpoint> = ordered
            .filter(|ep| Some(ep) != primary.as_ref())
            .collect();

        tracing::debug!(
            primary = ?primary.as_ref().map(Endpoint::as_str),
            fallbacks = fallbacks.len(),
            "Endpoint order resolved"
        );

        Selection { primary, fallbacks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HealthConfig;
    use crate::health::prober::tests::ScriptedProbe;

    fn selector_with(transport: Arc<ScriptedProbe>) -> Selector {
        let registry = Arc::new(HealthRegistry::new());
        let prober = Arc::new(HealthProber::new(
            registry.clone(),
            transport,
            &HealthConfig::default(),
        ));
        Selector::new(registry, prober)
    }

    fn eps(addrs: &[&str]) -> Vec<Endpoint> {
        addrs.iter().copied().map(Endpoint::new).collect()
    }

    #[tokio::test]
    async fn test_cold_start_keeps_configured_order() {
        let transport = Arc::new(ScriptedProbe::default());
        let selector = selector_with(transport.clone());

        let selection = selector.select_order("c\na\nb", false).await;
        assert_eq!(selection.primary, None);
        assert_eq!(selection.fallbacks, eps(&["c", "a", "b"]));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_list_yields_empty_selection() {
        let transport = Arc::new(ScriptedProbe::default());
        let selector = selector_with(transport.clone());

        let selection = selector.select_order(" \n\n", true).await;
        assert!(selection.is_empty());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_probed_endpoint_beats_unprobed() {
        let selector = selector_with(Arc::new(ScriptedProbe::default()));
        let a = Endpoint::new("A");
        for _ in 0..10 {
            selector.registry().record_success(&a, 50);
        }

        let selection = selector.select_order("A\nB", false).await;
        assert_eq!(selection.primary, Some(a));
        assert_eq!(selection.fallbacks, eps(&["B"]));
    }

    #[tokio::test]
    async fn test_ties_preserve_configured_order() {
        let selector = selector_with(Arc::new(ScriptedProbe::default()));
        // Registry must be non-empty to leave cold start.
        selector.registry().record_failure(&Endpoint::new("elsewhere"));

        let selection = selector.select_order("x\ny\nz", false).await;
        assert_eq!(selection.primary, Some(Endpoint::new("x")));
        assert_eq!(selection.fallbacks, eps(&["y", "z"]));
    }

    #[tokio::test]
    async fn test_failing_endpoint_sinks_below_unprobed() {
        let selector = selector_with(Arc::new(ScriptedProbe::default()));
        let bad = Endpoint::new("bad");
        for _ in 0..5 {
            selector.registry().record_failure(&bad);
        }

        let selection = selector.select_order("bad\nnew1\nnew2", false).await;
        assert_eq!(selection.primary, Some(Endpoint::new("new1")));
        assert_eq!(selection.fallbacks, eps(&["new2", "bad"]));
    }

    #[tokio::test]
    async fn test_primary_duplicates_removed_from_fallbacks() {
        let selector = selector_with(Arc::new(ScriptedProbe::default()));
        selector.registry().record_success(&Endpoint::new("a"), 20);

        let selection = selector.select_order("b\na\na", false).await;
        assert_eq!(selection.primary, Some(Endpoint::new("a")));
        assert_eq!(selection.fallbacks, eps(&["b"]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_check_probes_before_scoring() {
        let transport = Arc::new(
            ScriptedProbe::default()
                .with("slow", 2000, true)
                .with("down", 10, false)
                .with("fast", 20, true),
        );
        let selector = selector_with(transport.clone());

        let selection = selector.select_order("down\nslow\nfast", true).await;
        assert_eq!(transport.calls(), 3);
        assert_eq!(selection.primary, Some(Endpoint::new("fast")));
        assert_eq!(selection.fallbacks, eps(&["slow", "down"]));
    }
}
