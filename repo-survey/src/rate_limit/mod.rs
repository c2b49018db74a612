//! Rate limiting utilities for the GitHub API.
//!
//! Every API call made by a probe runs through [`RateLimitGuard::call`],
//! which sleeps according to a [`WaitStrategy`] whenever the quota is
//! exhausted and then repeats the call. [`ensure_core_rate_limit`] adds a
//! proactive check the runner performs before each repository.

mod guard;
mod info;
mod sleeper;
mod strategy;

pub use guard::{RateLimitGuard, RetryPredicate};
pub use info::RateLimitInfo;
pub use sleeper::{Sleeper, TokioSleeper};
pub use strategy::{RetryPolicy, WaitStrategy, DEFAULT_FIXED_WAIT, DEFAULT_RESET_BUFFER};

use crate::github::{ApiError, GitHubApi};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Maximum time to wait for rate limit reset (1 hour).
pub const MAX_WAIT_SECS: u64 = 3600;

/// Minimum remaining requests before proactively waiting.
pub const MIN_REMAINING_THRESHOLD: u32 = 5;

/// Current Unix time in seconds.
pub(crate) fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Waits if the rate limit is low, returning true if we waited.
///
/// Waits until the reported reset when remaining requests fall below
/// [`MIN_REMAINING_THRESHOLD`]. Nothing happens if the reset already passed.
pub async fn wait_if_needed(info: &RateLimitInfo, sleeper: &dyn Sleeper) -> bool {
    if info.remaining >= MIN_REMAINING_THRESHOLD {
        return false;
    }

    let wait_secs = info.secs_until_reset(now_unix());
    if wait_secs == 0 {
        return false;
    }

    if wait_secs > MAX_WAIT_SECS {
        warn!(
            wait_secs,
            max_wait = MAX_WAIT_SECS,
            "Rate limit reset too far in future, capping wait time"
        );
    }

    let actual_wait = wait_secs.min(MAX_WAIT_SECS);
    info!(
        remaining = info.remaining,
        wait_secs = actual_wait,
        "Rate limit low, waiting for reset"
    );

    sleeper.sleep(Duration::from_secs(actual_wait)).await;
    true
}

/// Ensures sufficient rate limit before making core API calls.
///
/// Returns whether a wait happened.
///
/// # Errors
///
/// Returns an error if the rate limit check fails.
pub async fn ensure_core_rate_limit(
    api: &dyn GitHubApi,
    sleeper: &dyn Sleeper,
) -> Result<bool, ApiError> {
    let info = api.rate_limit().await?;
    Ok(wait_if_needed(&info, sleeper).await)
}
