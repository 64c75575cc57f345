//! Endpoint scoring.
//!
//! Pure function from an endpoint's stats to a score in `[0, 1]`:
//!
//! ```text
//! score = clamp01(0.6 * success_rate + 0.3 * responsiveness + 0.1 * freshness)
//!
//! success_rate   = success / (success + fail)
//! responsiveness = 1000 / (avg_latency_ms + 100)      (not normalised)
//! freshness      = max(0, 1 - age / 30min)
//! ```
//!
//! Endpoints with no stats, or no recorded outcomes, score a neutral 0.5.

use std::time::Duration;
use tokio::time::Instant;

use crate::health::registry::EndpointStats;

/// Score given to endpoints that have never been observed.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Latency assumed when no successful latency has been recorded.
pub const DEFAULT_LATENCY_MS: f64 = 1000.0;

/// Age at which freshness reaches zero.
pub const FRESHNESS_HORIZON: Duration = Duration::from_secs(30 * 60);

const SUCCESS_WEIGHT: f64 = 0.6;
const RESPONSIVENESS_WEIGHT: f64 = 0.3;
const FRESHNESS_WEIGHT: f64 = 0.1;

/// Compute the score for one endpoint as of `now`.
pub fn score(stats: Option<&EndpointStats>, now: Instant) -> f64 {
    let Some(stats) = stats else {
        return NEUTRAL_SCORE;
    };

    let total = stats.total();
    if total == 0 {
        return NEUTRAL_SCORE;
    }

    let success_rate = stats.success_count as f64 / total as f64;
    let avg_latency = stats.average_latency_ms().unwrap_or(DEFAULT_LATENCY_MS);
    let responsiveness = 1000.0 / (avg_latency + 100.0);

    let age_ms = now.saturating_duration_since(stats.last_checked_at).as_millis() as f64;
    let freshness = (1.0 - age_ms / FRESHNESS_HORIZON.as_millis() as f64).max(0.0);

    let raw = SUCCESS_WEIGHT * success_rate
        + RESPONSIVENESS_WEIGHT * responsiveness
        + FRESHNESS_WEIGHT * freshness;

    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 1.0)
}
