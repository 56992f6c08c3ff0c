use std::time::Duration;
use tokio::time::Instant;

/// Expiry check for a single bounded wait, anchored when it is started.
#[derive(Clone, Copy, Debug)]
pub struct DeadlineClock {
    origin: Instant,
    budget: Duration,
}

impl DeadlineClock {
    pub fn start(budget: Duration) -> Self {
        Self {
            origin: Instant::now(),
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    /// True once the budget is used up. A zero budget is expired from the start.
    pub fn expired(&self) -> bool {
        self.elapsed() >= self.budget
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn zero_budget_is_expired_immediately() {
        assert!(DeadlineClock::start(Duration::ZERO).expired());
    }

    #[tokio::test(start_paused = true)]
    async fn expires_once_budget_elapses() {
        let clock = DeadlineClock::start(Duration::from_secs(10));
        assert!(!clock.expired());

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(!clock.expired());
        assert!(clock.remaining() <= Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(clock.expired());
        assert_eq!(clock.remaining(), Duration::ZERO);
    }
}
