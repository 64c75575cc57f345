//! Failover dispatch engine.
//!
//! # Responsibilities
//! - Resolve the attempt order (primary, then fallbacks) through the selector
//! - Run each endpoint's retry loop in turn until one succeeds
//! - Tag the result with the endpoint that served it
//! - Aggregate total failure into a single error carrying the last cause
//!
//! # Design Decisions
//! - An empty endpoint list fails before any probing or dispatch
//! - A failed primary is never retried again in the fallback walk
//! - Moving to the next endpoint adds no delay
//! - No global deadline; wrapping the whole call is up to the caller

use std::future::Future;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{DispatchConfig, HealthConfig};
use crate::dispatch::types::{DispatchError, DispatchResult, Dispatched};
use crate::health::{HealthProber, HealthRegistry, PassiveRecorder, ProbeTransport};
use crate::observability::metrics;
use crate::resilience::{self, AttemptFailure, BoxError, EndpointExhausted, RetryPolicy};
use crate::selection::{parse_endpoint_list, Endpoint, Selector};

/// Dispatches requests across a pool of interchangeable endpoints.
pub struct DispatchEngine {
    selector: Selector,
    recorder: PassiveRecorder,
}

impl DispatchEngine {
    /// Build an engine around an existing registry and prober.
    pub fn new(
        registry: Arc<HealthRegistry>,
        prober: Arc<HealthProber>,
        health: &HealthConfig,
    ) -> Self {
        let recorder = PassiveRecorder::new(registry.clone(), health.record_request_outcomes);
        Self {
            selector: Selector::new(registry, prober),
            recorder,
        }
    }

    /// Build an engine with a fresh registry, probing through `transport`.
    pub fn with_transport(transport: Arc<dyn ProbeTransport>, health: &HealthConfig) -> Self {
        let registry = Arc::new(HealthRegistry::new());
        let prober = Arc::new(HealthProber::new(registry.clone(), transport, health));
        Self::new(registry, prober, health)
    }

    pub fn registry(&self) -> &Arc<HealthRegistry> {
        self.selector.registry()
    }

    pub fn prober(&self) -> &Arc<HealthProber> {
        self.selector.prober()
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Dispatch `request_fn` over the newline-separated `endpoint_list`.
    pub async fn run<P, T, E, F, Fut>(
        &self,
        endpoint_list: &str,
        params: P,
        request_fn: F,
        config: &DispatchConfig,
    ) -> DispatchResult<T>
    where
        P: Clone,
        F: Fn(Endpoint, P) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let endpoints = parse_endpoint_list(endpoint_list);
        self.run_endpoints(&endpoints, params, request_fn, config).await
    }

    /// Dispatch `request_fn` over already-parsed endpoints.
    pub async fn run_endpoints<P, T, E, F, Fut>(
        &self,
        endpoints: &[Endpoint],
        params: P,
        request_fn: F,
        config: &DispatchConfig,
    ) -> DispatchResult<T>
    where
        P: Clone,
        F: Fn(Endpoint, P) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let span = tracing::info_span!("dispatch", dispatch_id = %Uuid::new_v4());
        async move {
            let start = Instant::now();

            if endpoints.is_empty() {
                tracing::warn!("Dispatch requested with no endpoints configured");
                metrics::record_dispatch("no_endpoints", start.elapsed());
                return Err(DispatchError::NoEndpointsConfigured);
            }

            let selection = self
                .selector
                .order(endpoints, config.health_check_enabled)
                .await;
            let policy = RetryPolicy::from_config(config);
            let has_primary = selection.primary.is_some();

            let mut attempted = 0;
            let mut last_failure: Option<AttemptFailure> = None;

            for (idx, endpoint) in selection.attempt_order().enumerate() {
                let role = if has_primary && idx == 0 { "primary" } else { "fallback" };
                attempted += 1;

                match self
                    .attempt_with_retry(endpoint, &params, &request_fn, &policy)
                    .await
                {
                    Ok(data) => {
                        tracing::info!(
                            server = %endpoint,
                            role,
                            endpoints_tried = attempted,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "Dispatch succeeded"
                        );
                        metrics::record_dispatch("success", start.elapsed());
                        return Ok(Dispatched {
                            data,
                            server: endpoint.clone(),
                        });
                    }
                    Err(exhausted) => {
                        tracing::info!(
                            endpoint = %endpoint,
                            role,
                            attempts = exhausted.attempts,
                            "Endpoint failed, advancing"
                        );
                        last_failure = Some(exhausted.last);
                    }
                }
            }

            metrics::record_dispatch("exhausted", start.elapsed());
            match last_failure {
                Some(last) => {
                    tracing::error!(attempted, error = %last, "All endpoints failed");
                    Err(DispatchError::AllEndpointsFailed { attempted, last })
                }
                None => Err(DispatchError::NoEndpointsConfigured),
            }
        }
        .instrument(span)
        .await
    }

    /// Run one endpoint's full retry loop.
    pub async fn attempt_with_retry<P, T, E, F, Fut>(
        &self,
        endpoint: &Endpoint,
        params: &P,
        request_fn: &F,
        policy: &RetryPolicy,
    ) -> Result<T, EndpointExhausted>
    where
        P: Clone,
        F: Fn(Endpoint, P) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        resilience::attempt_with_retry(endpoint, policy, &self.recorder, || {
            request_fn(endpoint.clone(), params.clone())
        })
        .await
    }
}
