//! Bounded retry-with-backoff for rate-limited remote calls.
//!
//! Only failures classified by [`ServiceError::is_rate_limited`] are retried.
//! Anything else (auth, bad request, 5xx, transport, malformed payload) is
//! returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::{Result, ServiceError};

/// Retry configuration for a single remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub retries: u32,
    /// Wait before the first retry.
    pub cooldown: Duration,
    /// Double the wait after every retry.
    pub exponential: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 5,
            cooldown: Duration::from_secs(2),
            exponential: true,
        }
    }
}

impl RetryPolicy {
    /// Create an exponential policy with the given attempt limit and initial cooldown.
    pub fn new(retries: u32, cooldown: Duration) -> Self {
        Self {
            retries,
            cooldown,
            exponential: true,
        }
    }

    /// Select exponential (`true`) or fixed (`false`) backoff.
    pub fn with_exponential(mut self, exponential: bool) -> Self {
        self.exponential = exponential;
        self
    }

    /// The waits taken before each retry, in order.
    ///
    /// Yields `retries - 1` durations: `C, 2C, 4C, ...` when exponential,
    /// `C, C, C, ...` otherwise.
    pub fn cooldowns(&self) -> impl Iterator<Item = Duration> {
        let exponential = self.exponential;
        let retries = self.retries.max(1) as usize;
        std::iter::successors(Some(self.cooldown), move |prev| {
            Some(if exponential {
                prev.saturating_mul(2)
            } else {
                *prev
            })
        })
        .take(retries - 1)
    }

    /// Run `operation`, retrying on rate-limit failures.
    ///
    /// At least one attempt is always made.
    ///
    /// # Errors
    ///
    /// Returns the first non-rate-limit failure unchanged, or the last
    /// rate-limit failure once the attempt budget is spent.
    pub async fn call<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut waits = self.cooldowns();
        let mut attempt: u32 = 1;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_rate_limited() => err,
                Err(err) => return Err(err),
            };
            let Some(wait) = waits.next() else {
                tracing::debug!(attempt, error = %err, "retry budget exhausted");
                return Err(err);
            };
            tracing::warn!(
                attempt,
                cooldown_secs = wait.as_secs_f64(),
                error = %err,
                "too many requests, cooling down"
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}

/// Convenience for tests and adapters: a rate-limit failure from `provider`.
pub fn rate_limited(provider: &str, message: impl Into<String>) -> ServiceError {
    ServiceError::RateLimited {
        provider: provider.to_string(),
        message: message.into(),
    }
}
