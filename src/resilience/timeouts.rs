//! Timeout enforcement for a single attempt.
//!
//! # Design Decisions
//! - The request future is raced against a deadline with `tokio::time::timeout`
//! - On timeout the future is dropped. Transports that observe drop (reqwest)
//!   cancel the call; others are abandoned, not killed
//! - Timeouts are distinct from request errors

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time;

use crate::selection::Endpoint;

/// Any error a request function may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why one attempt failed.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    /// The attempt did not settle within its deadline.
    #[error("attempt against {endpoint} timed out after {timeout_ms} ms")]
    Timeout { endpoint: Endpoint, timeout_ms: u64 },

    /// The request function itself failed.
    #[error("attempt against {endpoint} failed: {source}")]
    Error {
        endpoint: Endpoint,
        #[source]
        source: BoxError,
    },
}

impl AttemptFailure {
    /// The endpoint the failed attempt targeted.
    pub fn endpoint(&self) -> &Endpoint {
        match self {
            AttemptFailure::Timeout { endpoint, .. } | AttemptFailure::Error { endpoint, .. } => {
                endpoint
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AttemptFailure::Timeout { .. })
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptFailure::Timeout { .. } => "timeout",
            AttemptFailure::Error { .. } => "error",
        }
    }
}

/// Run one attempt against `endpoint`, failing if it outlives `timeout`.
pub async fn attempt_with_deadline<T, E, Fut>(
    endpoint: &Endpoint,
    timeout: Duration,
    attempt: Fut,
) -> Result<T, AttemptFailure>
where
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    match time::timeout(timeout, attempt).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(AttemptFailure::Error {
            endpoint: endpoint.clone(),
            source: e.into(),
        }),
        Err(_) => Err(AttemptFailure::Timeout {
            endpoint: endpoint.clone(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
