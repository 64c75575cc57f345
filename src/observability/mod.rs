//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, one span per dispatch)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stderr log stream
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - Every dispatch carries a generated ID so its attempts correlate in logs
//! - Metrics are cheap and optional; the library never installs a recorder itself

pub mod logging;
pub mod metrics;
