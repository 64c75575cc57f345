//! Endpoint selection subsystem.
//!
//! # Data Flow
//! ```text
//! Endpoint list text
//!     → endpoint.rs (trim, drop blanks, keep order)
//!     → selector.rs
//!         → prober refresh (if health checks enabled and due)
//!         → score every endpoint
//!         → stable sort, best first
//!     → Selection { primary, fallbacks }
//! ```
//!
//! # Design Decisions
//! - Selection is stateless; all state lives in the health registry
//! - No endpoint is ever excluded, only reordered

pub mod endpoint;
pub mod selector;

pub use endpoint::{parse_endpoint_list, Endpoint};
pub use selector::{Selection, Selector};
