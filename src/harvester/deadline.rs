//! Run-wide deadline
//!
//! A run gets one wall-clock budget. Every bounded wait in the run asks the
//! [`Deadline`] for its timeout, which clamps the request to whatever is left
//! of the budget and refuses outright once nothing is left.

use std::time::{Duration, Instant};
use thiserror::Error;

/// Upper bound on a run budget, so `start + budget` cannot overflow
const MAX_BUDGET: Duration = Duration::from_secs(10 * 365 * 24 * 3600);

/// The run-wide budget has been used up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("run-wide timeout of {}s exhausted", .budget.as_secs())]
pub struct DeadlineExhausted {
    pub budget: Duration,
}

/// A fixed instant after which no further waits are granted
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
    at: Instant,
}

impl Deadline {
    /// Creates a deadline `budget` after `start`
    pub fn new(start: Instant, budget: Duration) -> Self {
        let budget = budget.min(MAX_BUDGET);
        Self {
            start,
            budget,
            at: start + budget,
        }
    }

    /// Clamps `wait` to the remaining budget
    ///
    /// # Returns
    ///
    /// * `Ok(Duration)` - `min(wait, deadline - now)`, always non-zero
    /// * `Err(DeadlineExhausted)` - the clamped wait would be zero
    pub fn until(&self, wait: Duration) -> Result<Duration, DeadlineExhausted> {
        self.until_at(Instant::now(), wait)
    }

    /// Same as [`Deadline::until`] with an explicit current instant
    pub fn until_at(&self, now: Instant, wait: Duration) -> Result<Duration, DeadlineExhausted> {
        let granted = wait.min(self.at.saturating_duration_since(now));
        if granted.is_zero() {
            return Err(DeadlineExhausted {
                budget: self.budget,
            });
        }
        Ok(granted)
    }

    /// Time left before the deadline
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Time since the run started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }
}
