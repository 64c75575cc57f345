//! Resilient failover dispatcher for pools of interchangeable endpoints.

pub mod config;
pub mod dispatch;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod selection;

pub use config::{DispatchConfig, DispatcherConfig};
pub use dispatch::{DispatchEngine, DispatchError, Dispatched};
pub use health::{HealthProber, HealthRegistry, RegistryJanitor};
pub use selection::{Endpoint, Selection, Selector};
