//! Fixed-budget polling.
//!
//! Every wait in the harness uses the same strategy: observe, and if the
//! condition does not hold yet, sleep a fixed delay and observe again, up to a
//! fixed number of observations. There is no backoff and no jitter, so a run's
//! worst-case duration is simply `attempts × delay` per wait.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default number of observations per wait.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Default delay between observations.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(60);

/// Retry budget applied to a single poll operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of observations (at least 1)
    pub max_attempts: u32,
    /// Sleep between observations
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy, rejecting a zero attempt budget.
    pub fn new(max_attempts: u32, delay: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(Error::invalid_config("retry attempts must be at least 1"));
        }
        Ok(Self {
            max_attempts,
            delay,
        })
    }

    /// Same delay, twice the attempts. Used while a scale change converges.
    pub fn doubled(&self) -> Self {
        Self {
            max_attempts: self.max_attempts.saturating_mul(2),
            delay: self.delay,
        }
    }

    /// Upper bound on wall-clock time spent sleeping by one poll.
    pub fn max_wait(&self) -> Duration {
        self.delay.saturating_mul(self.max_attempts.saturating_sub(1))
    }
}

/// Outcome of a single observation.
#[derive(Debug)]
pub enum Observation<T> {
    /// Condition holds; stop polling
    Ready(T),
    /// Condition does not hold yet; the string describes what was observed
    Pending(String),
}

/// Poll `observe` until it reports [`Observation::Ready`] or the budget runs out.
///
/// An observation that returns `Err` counts as a failed attempt and is
/// retried. The sleep only happens between observations, so a condition that
/// already holds returns after exactly one call without sleeping. On
/// exhaustion the error carries the last observation.
pub async fn poll_until<F, Fut, T, E>(policy: &RetryPolicy, what: &str, mut observe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<Observation<T>, E>>,
    E: Display,
{
    let start = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut last = String::from("no observation");

    for attempt in 1..=max_attempts {
        match observe().await {
            Ok(Observation::Ready(value)) => {
                debug!(what = %what, attempt, "Condition met");
                return Ok(value);
            }
            Ok(Observation::Pending(observed)) => {
                debug!(what = %what, attempt, observed = %observed, "Condition not met yet");
                last = observed;
            }
            Err(e) => {
                warn!(what = %what, attempt, error = %e, "Observation failed");
                last = e.to_string();
            }
        }

        if attempt < max_attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    Err(Error::Timeout {
        what: what.to_string(),
        attempts: max_attempts,
        elapsed: start.elapsed(),
        last,
    })
}
