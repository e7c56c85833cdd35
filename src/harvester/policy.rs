//! Per-attempt timeouts and retry pacing

use crate::config::RetryConfig;
use crate::harvester::deadline::Deadline;
use rand::Rng;
use std::time::Duration;

/// Inclusive range an attempt timeout is drawn from
///
/// Drawing a fresh value for every attempt keeps retries against the same
/// host from lining up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutRange {
    pub min: Duration,
    pub max: Duration,
}

impl TimeoutRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn from_secs(min: u64, max: u64) -> Self {
        Self::new(Duration::from_secs(min), Duration::from_secs(max))
    }

    /// Draws a timeout with millisecond resolution
    pub fn sample(&self) -> Duration {
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }
}

/// Timeout ranges for both fetch phases plus the pause after a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub dashboard: TimeoutRange,
    pub feed: TimeoutRange,
    pub pause: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            dashboard: TimeoutRange::from_secs(
                config.dashboard_timeout_min,
                config.dashboard_timeout_max,
            ),
            feed: TimeoutRange::from_secs(config.feed_timeout_min, config.feed_timeout_max),
            pause: Duration::from_millis(config.pause_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Sleeps for `wait`, cut short by the deadline
///
/// Never fails: once the budget is gone this returns immediately and the
/// next [`Deadline::until`] call reports the expiry.
pub async fn pause_within(deadline: &Deadline, wait: Duration) {
    if wait.is_zero() {
        return;
    }
    if let Ok(granted) = deadline.until(wait) {
        tokio::time::sleep(granted).await;
    }
}
