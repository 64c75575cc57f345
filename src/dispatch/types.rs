//! Dispatch result and error definitions.

use serde::Serialize;
use thiserror::Error;

use crate::resilience::AttemptFailure;
use crate::selection::Endpoint;

/// A successful dispatch: the payload and the endpoint that served it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dispatched<T> {
    pub data: T,
    pub server: Endpoint,
}

/// Failures surfaced to the caller of a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The endpoint list was empty or blank. Nothing was attempted.
    #[error("no endpoints configured")]
    NoEndpointsConfigured,

    /// Every endpoint spent its attempt budget.
    #[error("all {attempted} endpoints failed, last error: {last}")]
    AllEndpointsFailed {
        attempted: usize,
        #[source]
        last: AttemptFailure,
    },
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<Dispatched<T>, DispatchError>;
