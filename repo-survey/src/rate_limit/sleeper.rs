//! Suspension point used by the rate-limit loop.

use async_trait::async_trait;
use std::time::Duration;

/// Something that can suspend the current task.
///
/// Production code sleeps on the tokio timer; tests swap in a recorder so
/// sleeps can be counted without waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspends for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_advances_clock() {
        let start = Instant::now();
        TokioSleeper.sleep(Duration::from_secs(1200)).await;
        assert!(start.elapsed() >= Duration::from_secs(1200));
    }
}
