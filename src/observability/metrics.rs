//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_probes_total` (counter): probe outcomes by endpoint
//! - `dispatch_probe_latency_ms` (histogram): successful probe latency
//! - `dispatch_attempts_total` (counter): attempt outcomes by endpoint
//! - `dispatch_requests_total` (counter): dispatch results by outcome
//! - `dispatch_request_duration_seconds` (histogram): whole dispatch latency
//! - `dispatch_registry_endpoints` (gauge): tracked endpoints
//! - `dispatch_registry_evictions_total` (counter): stale entries removed
//! - `dispatch_endpoint_score` (gauge): last computed score by endpoint
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::selection::Endpoint;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_probe(endpoint: &Endpoint, success: bool, latency_ms: Option<u64>) {
    let outcome = if success { "success" } else { "failure" };
    counter!("dispatch_probes_total", "endpoint" => endpoint.to_string(), "outcome" => outcome)
        .increment(1);
    if let Some(ms) = latency_ms {
        histogram!("dispatch_probe_latency_ms", "endpoint" => endpoint.to_string())
            .record(ms as f64);
    }
}

pub fn record_attempt(endpoint: &Endpoint, outcome: &'static str) {
    counter!("dispatch_attempts_total", "endpoint" => endpoint.to_string(), "outcome" => outcome)
        .increment(1);
}

pub fn record_dispatch(outcome: &'static str, elapsed: Duration) {
    counter!("dispatch_requests_total", "outcome" => outcome).increment(1);
    histogram!("dispatch_request_duration_seconds", "outcome" => outcome)
        .record(elapsed.as_secs_f64());
}

pub fn record_registry_size(size: usize) {
    gauge!("dispatch_registry_endpoints").set(size as f64);
}

pub fn record_evictions(count: usize) {
    counter!("dispatch_registry_evictions_total").increment(count as u64);
}

pub fn record_score(endpoint: &Endpoint, score: f64) {
    gauge!("dispatch_endpoint_score", "endpoint" => endpoint.to_string()).set(score);
}
