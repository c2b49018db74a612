//! Rate limit information.

use serde::Serialize;

/// Rate limit information for the core REST resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    /// Requests remaining in the current window.
    pub remaining: u32,

    /// Unix timestamp when the rate limit resets.
    pub reset: u64,

    /// Total requests allowed per window.
    pub limit: u32,
}

impl RateLimitInfo {
    /// Returns true when no requests remain.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Seconds until reset relative to `now`, zero if already passed.
    #[must_use]
    pub fn secs_until_reset(&self, now: u64) -> u64 {
        self.reset.saturating_sub(now)
    }
}
