//! Sleep-and-retry loop around a single API call.

use super::{now_unix, RetryPolicy, Sleeper, TokioSleeper};
use crate::github::ApiError;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

/// Predicate deciding whether an error should be retried after a wait.
pub type RetryPredicate = fn(&ApiError) -> bool;

/// Wraps API calls so that quota exhaustion suspends and retries them.
#[derive(Clone)]
pub struct RateLimitGuard {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    retryable: RetryPredicate,
}

impl std::fmt::Debug for RateLimitGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitGuard")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Default for RateLimitGuard {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), Arc::new(TokioSleeper))
    }
}

impl RateLimitGuard {
    /// Creates a guard retrying rate-limited errors under `policy`.
    pub fn new(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            policy,
            sleeper,
            retryable: ApiError::is_rate_limited,
        }
    }

    /// Replaces the retry predicate.
    #[must_use]
    pub fn with_retry_predicate(mut self, retryable: RetryPredicate) -> Self {
        self.retryable = retryable;
        self
    }

    /// Returns the retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Returns the sleeper used between attempts.
    pub fn sleeper(&self) -> &dyn Sleeper {
        self.sleeper.as_ref()
    }

    /// Runs `operation`, sleeping and retrying while it fails with a
    /// retryable error.
    ///
    /// Successes return immediately. Non-retryable errors are returned
    /// without sleeping. When `max_retries` is set and exhausted, the last
    /// rate-limit error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error, or the last retryable one once
    /// the retry bound is reached.
    pub async fn call<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempts: u32 = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if (self.retryable)(&error) => {
                    if let Some(max) = self.policy.max_retries {
                        if attempts >= max {
                            warn!(call = label, attempts, "Giving up after rate limit retries");
                            return Err(error);
                        }
                    }

                    attempts += 1;
                    let wait = self.policy.strategy.wait_for(&error, now_unix());
                    warn!(
                        call = label,
                        attempt = attempts,
                        wait_secs = wait.as_secs(),
                        "Rate limit exceeded, sleeping before retry"
                    );
                    self.sleeper.sleep(wait).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
