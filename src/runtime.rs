#![forbid(unsafe_code)]

use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

/// Sleeps for a duration but aborts early if the shutdown token fires.
/// Returns `true` if shutdown occurred during the wait.
pub async fn sleep_with_shutdown(duration: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => true,
        _ = sleep(duration) => false,
    }
}

/// Fixed-interval ticker for polling loops. No backoff, no jitter.
#[derive(Clone, Debug)]
pub struct PollTicker {
    interval: Duration,
    shutdown: CancellationToken,
}

impl PollTicker {
    pub fn new(interval: Duration, shutdown: CancellationToken) -> Self {
        Self { interval, shutdown }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_cancelled(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Waits one interval. Returns `false` when the wait was cut short by cancellation.
    pub async fn tick(&self) -> bool {
        !sleep_with_shutdown(self.interval, &self.shutdown).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn tick_waits_the_full_interval() {
        let ticker = PollTicker::new(Duration::from_secs(5), CancellationToken::new());
        let start = Instant::now();
        assert!(ticker.tick().await);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_cuts_tick_short() {
        let token = CancellationToken::new();
        token.cancel();
        let ticker = PollTicker::new(Duration::from_secs(60), token);
        let start = Instant::now();
        assert!(!ticker.tick().await);
        assert!(ticker.is_cancelled());
        assert!(start.elapsed() < Duration::from_secs(60));
    }
}
