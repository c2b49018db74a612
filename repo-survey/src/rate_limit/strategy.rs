//! Wait strategies applied when the quota is exhausted.

use super::MAX_WAIT_SECS;
use crate::github::ApiError;
use std::time::Duration;

/// Default fixed sleep after quota exhaustion.
pub const DEFAULT_FIXED_WAIT: Duration = Duration::from_secs(20 * 60);

/// Default margin added after the reported reset time.
pub const DEFAULT_RESET_BUFFER: Duration = Duration::from_secs(60);

/// How long to sleep after a rate-limited response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Always sleep the same duration.
    Fixed(Duration),

    /// Sleep until the reported reset plus `buffer`, or for `Retry-After`
    /// seconds when given. Sleeps `fallback` when neither is known.
    UntilReset { buffer: Duration, fallback: Duration },
}

impl Default for WaitStrategy {
    fn default() -> Self {
        Self::UntilReset {
            buffer: DEFAULT_RESET_BUFFER,
            fallback: DEFAULT_FIXED_WAIT,
        }
    }
}

impl WaitStrategy {
    /// Computes the wait for `error` at Unix time `now`, capped at one hour.
    #[must_use]
    pub fn wait_for(&self, error: &ApiError, now: u64) -> Duration {
        let wait = match *self {
            Self::Fixed(duration) => duration,
            Self::UntilReset { buffer, fallback } => match error {
                ApiError::RateLimited {
                    retry_after: Some(secs),
                    ..
                } => Duration::from_secs(*secs),
                ApiError::RateLimited {
                    reset_at: Some(reset),
                    ..
                } => Duration::from_secs(reset.saturating_sub(now)) + buffer,
                _ => fallback,
            },
        };

        wait.min(Duration::from_secs(MAX_WAIT_SECS))
    }
}

/// Wait strategy plus an optional bound on retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// How long to sleep between attempts.
    pub strategy: WaitStrategy,

    /// Maximum number of retries; `None` retries until the call succeeds.
    pub max_retries: Option<u32>,
}

impl RetryPolicy {
    /// Creates a policy that retries without bound.
    #[must_use]
    pub fn new(strategy: WaitStrategy) -> Self {
        Self {
            strategy,
            max_retries: None,
        }
    }

    /// Bounds the number of retries.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limited(reset_at: Option<u64>, retry_after: Option<u64>) -> ApiError {
        ApiError::RateLimited {
            reset_at,
            retry_after,
        }
    }

    #[test]
    fn fixed_ignores_headers() {
        let strategy = WaitStrategy::Fixed(Duration::from_secs(900));
        assert_eq!(
            strategy.wait_for(&limited(Some(5_000), None), 1_000),
            Duration::from_secs(900)
        );
    }

    #[test]
    fn until_reset_adds_buffer() {
        let strategy = WaitStrategy::default();
        assert_eq!(
            strategy.wait_for(&limited(Some(1_300), None), 1_000),
            Duration::from_secs(360)
        );
    }

    #[test]
    fn until_reset_prefers_retry_after() {
        let strategy = WaitStrategy::default();
        assert_eq!(
            strategy.wait_for(&limited(Some(1_300), Some(30)), 1_000),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn until_reset_falls_back_without_headers() {
        let strategy = WaitStrategy::default();
        assert_eq!(
            strategy.wait_for(&limited(None, None), 1_000),
            DEFAULT_FIXED_WAIT
        );
    }

    #[test]
    fn waits_are_capped() {
        let strategy = WaitStrategy::default();
        assert_eq!(
            strategy.wait_for(&limited(Some(100_000), None), 0),
            Duration::from_secs(MAX_WAIT_SECS)
        );
    }
}
