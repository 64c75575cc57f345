//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Caller: run(endpoint list, params, request_fn, config)
//!     → engine.rs
//!         → parse list (empty: NoEndpointsConfigured)
//!         → selection::Selector (primary + fallbacks)
//!         → resilience retry loop per endpoint, in order
//!     → Dispatched { data, server } or AllEndpointsFailed
//!
//! http.rs adapts reqwest to the request-function and probe seams.
//! ```
//!
//! # Design Decisions
//! - The request function is opaque: any async `(endpoint, params) -> Result`
//! - The engine never inspects payloads; only success/failure matters
//! - Total failure is an ordinary error value, never a panic

pub mod engine;
pub mod http;
pub mod types;

pub use engine::DispatchEngine;
pub use http::{HttpError, HttpProbe, HttpRequester};
pub use types::{DispatchError, DispatchResult, Dispatched};
