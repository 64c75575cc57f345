//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize logging and (optionally) metrics from configuration
//! - Assemble registry, prober, engine and janitor around one shared registry
//!
//! # Design Decisions
//! - Subsystems initialize in dependency order: registry, prober, engine
//! - The HTTP probe transport is the default; tests inject their own

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::{DispatcherConfig, HealthConfig};
use crate::dispatch::{DispatchEngine, HttpError, HttpProbe, HttpRequester};
use crate::health::{HealthProber, HealthRegistry, ProbeTransport, RegistryJanitor};
use crate::observability::{logging, metrics};

/// The assembled dispatcher components.
pub struct Components {
    pub registry: Arc<HealthRegistry>,
    pub prober: Arc<HealthProber>,
    pub engine: Arc<DispatchEngine>,
    pub requester: HttpRequester,
}

impl Components {
    /// Build every component, probing over HTTP.
    pub fn build(config: &DispatcherConfig) -> Result<Self, HttpError> {
        let requester = HttpRequester::new()?;
        let transport = Arc::new(HttpProbe::new(
            requester.clone(),
            config.health.probe_path.clone(),
        ));
        Ok(Self::with_transport(config, transport, requester))
    }

    /// Build every component around a custom probe transport.
    pub fn with_transport(
        config: &DispatcherConfig,
        transport: Arc<dyn ProbeTransport>,
        requester: HttpRequester,
    ) -> Self {
        let registry = Arc::new(HealthRegistry::new());
        let prober = Arc::new(HealthProber::new(registry.clone(), transport, &config.health));
        let engine = Arc::new(DispatchEngine::new(
            registry.clone(),
            prober.clone(),
            &config.health,
        ));
        Self {
            registry,
            prober,
            engine,
            requester,
        }
    }

    /// A janitor sweeping this registry.
    pub fn janitor(&self, config: &DispatcherConfig) -> RegistryJanitor {
        RegistryJanitor::new(self.registry.clone(), &config.health)
    }

    /// A new HTTP prober over this registry, for reloaded health settings.
    pub fn prober_for(&self, health: &HealthConfig) -> Arc<HealthProber> {
        let transport = Arc::new(HttpProbe::new(
            self.requester.clone(),
            health.probe_path.clone(),
        ));
        Arc::new(HealthProber::new(self.registry.clone(), transport, health))
    }
}

/// Initialize logging, then metrics if enabled.
pub fn init_observability(config: &DispatcherConfig) {
    logging::init_logging(&config.observability);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }
}
