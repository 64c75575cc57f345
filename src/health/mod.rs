//! Endpoint health subsystem.
//!
//! # Data Flow
//! ```text
//! Active probing (prober.rs):
//!     Selector asks for a refresh
//!     → pool throttle (once per window, single flight)
//!     → probe every endpoint concurrently
//!     → registry.rs records success + latency, or failure
//!
//! Passive feedback (passive.rs, optional):
//!     Dispatch attempt settles
//!     → registry.rs records the outcome
//!
//! Scoring (score.rs):
//!     registry stats → score in [0, 1]
//!
//! Eviction (janitor.rs):
//!     Periodic timer
//!     → drop entries not checked for 30 minutes
//! ```
//!
//! # Design Decisions
//! - The registry is the only shared mutable state; everything else reads snapshots
//! - Unprobed endpoints score neutral (0.5), not zero
//! - Stats only grow; they are never reset, only evicted

pub mod janitor;
pub mod passive;
pub mod prober;
pub mod registry;
pub mod score;

pub use janitor::RegistryJanitor;
pub use passive::PassiveRecorder;
pub use prober::{BatchOutcome, HealthProber, ProbeError, ProbeTransport};
pub use registry::{EndpointReport, EndpointStats, HealthRegistry};
