use super::clock::DeadlineClock;
use std::time::Duration;

pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(10);
pub const INVENTORY_TIMEOUT: Duration = Duration::from_secs(600);
pub const INVENTORY_INTERVAL: Duration = Duration::from_secs(5);

/// Timeout and constant re-poll interval for one polling loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl PollPolicy {
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    pub const fn from_secs(timeout_secs: u64, interval_secs: u64) -> Self {
        Self::new(
            Duration::from_secs(timeout_secs),
            Duration::from_secs(interval_secs),
        )
    }

    /// Fixed policy for the per-instance inventory wait.
    pub const fn inventory() -> Self {
        Self::new(INVENTORY_TIMEOUT, INVENTORY_INTERVAL)
    }

    pub fn start_clock(&self) -> DeadlineClock {
        DeadlineClock::start(self.timeout)
    }

    /// The interval is not required to be shorter than the timeout; such a policy still polls once.
    pub fn interval_exceeds_timeout(&self) -> bool {
        self.interval >= self.timeout
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_TIMEOUT, DEFAULT_STATUS_INTERVAL)
    }
}
