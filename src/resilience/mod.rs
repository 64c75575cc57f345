//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt against one endpoint:
//!     → timeouts.rs (race the request against its deadline)
//!     → On failure: retries.rs (fixed delay, retry same endpoint)
//!     → Budget spent: EndpointExhausted, caller advances to next endpoint
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Fixed delay between retries as simple backpressure
//! - Per-attempt failures never escape this layer on their own

pub mod retries;
pub mod timeouts;

pub use retries::{attempt_with_retry, EndpointExhausted, RetryPolicy};
pub use timeouts::{attempt_with_deadline, AttemptFailure, BoxError};
