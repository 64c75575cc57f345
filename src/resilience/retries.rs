//! Retry logic for a single endpoint.
//!
//! # Responsibilities
//! - Run up to `retry_count + 1` deadline-bounded attempts against one endpoint
//! - Pause a fixed delay between a failed attempt and the next one
//! - Report exhaustion so the caller can move to the next endpoint
//!
//! # Design Decisions
//! - Fixed delay, no exponential growth and no jitter
//! - No delay after the final attempt; advancing to another endpoint is immediate
//! - Timeouts and request errors are retried the same way
//!
//! ```text
//! Pending ─┬─▶ Success
//!          ├─▶ TimedOut ─┬─▶ Pending    (attempts left, after delay)
//!          └─▶ Errored  ─┴─▶ Exhausted  (budget spent)
//! ```

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{self, Instant};

use crate::config::DispatchConfig;
use crate::health::PassiveRecorder;
use crate::observability::metrics;
use crate::resilience::timeouts::{attempt_with_deadline, AttemptFailure, BoxError};
use crate::selection::Endpoint;

/// Attempt budget and pacing for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Deadline for each attempt.
    pub attempt_timeout: Duration,
    /// Retries after the first attempt.
    pub retry_count: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            attempt_timeout: Duration::from_millis(config.timeout_ms),
            retry_count: config.retry_count,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Total attempts allowed.
    pub fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}

/// One endpoint spent its whole attempt budget.
#[derive(Debug, Error)]
#[error("endpoint {endpoint} exhausted after {attempts} attempts")]
pub struct EndpointExhausted {
    pub endpoint: Endpoint,
    pub attempts: u32,
    #[source]
    pub last: AttemptFailure,
}

/// Attempt `call` against `endpoint` until it succeeds or the budget is spent.
pub async fn attempt_with_retry<T, E, F, Fut>(
    endpoint: &Endpoint,
    policy: &RetryPolicy,
    recorder: &PassiveRecorder,
    mut call: F,
) -> Result<T, EndpointExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let start = Instant::now();

        match attempt_with_deadline(endpoint, policy.attempt_timeout, call()).await {
            Ok(value) => {
                recorder.success(endpoint, start.elapsed());
                metrics::record_attempt(endpoint, "success");
                tracing::debug!(endpoint = %endpoint, attempt, "Attempt succeeded");
                return Ok(value);
            }
            Err(failure) => {
                recorder.failure(endpoint);
                metrics::record_attempt(endpoint, failure.kind());

                if attempt >= max_attempts {
                    tracing::warn!(
                        endpoint = %endpoint,
                        attempts = attempt,
                        error = %failure,
                        "Endpoint exhausted"
                    );
                    return Err(EndpointExhausted {
                        endpoint: endpoint.clone(),
                        attempts: attempt,
                        last: failure,
                    });
                }

                tracing::info!(
                    endpoint = %endpoint,
                    attempt,
                    delay = ?policy.retry_delay,
                    error = %failure,
                    "Retrying endpoint"
                );
                time::sleep(policy.retry_delay).await;
            }
        }
    }
}
