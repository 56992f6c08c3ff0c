use super::observer::{ReadinessEvent, ReadinessObserver};
use super::outcome::InventoryError;
use super::policy::PollPolicy;
use super::state::ReadinessPhase;
use crate::control_plane::InventoryQuerier;
use crate::domain::{InstanceId, InventoryFilter};
use crate::runtime::PollTicker;
use tokio_util::sync::CancellationToken;

/// Polls inventory for a single instance until it shows up or its own deadline passes.
pub struct InventoryPresencePoller<'a> {
    querier: &'a dyn InventoryQuerier,
    observer: &'a dyn ReadinessObserver,
    policy: PollPolicy,
    shutdown: CancellationToken,
}

impl<'a> InventoryPresencePoller<'a> {
    pub fn new(
        querier: &'a dyn InventoryQuerier,
        observer: &'a dyn ReadinessObserver,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            querier,
            observer,
            policy: PollPolicy::inventory(),
            shutdown,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Returns the number of queries it took to see the instance.
    pub async fn wait_present(&self, instance: &InstanceId) -> Result<u32, InventoryError> {
        let clock = self.policy.start_clock();
        let ticker = PollTicker::new(self.policy.interval, self.shutdown.clone());
        let filter = InventoryFilter::instance(instance);
        let mut attempts = 0u32;

        loop {
            if ticker.is_cancelled() {
                return Err(InventoryError::Cancelled {
                    instance: instance.clone(),
                });
            }
            if clock.expired() {
                return Err(InventoryError::Timeout {
                    instance: instance.clone(),
                    timeout: self.policy.timeout,
                });
            }

            attempts += 1;
            let entries = self
                .querier
                .query_inventory(&filter)
                .await
                .map_err(|source| InventoryError::Api {
                    instance: instance.clone(),
                    source,
                })?;

            if !entries.is_empty() {
                self.observer
                    .observe(&ReadinessEvent::InventoryPresent { instance });
                return Ok(attempts);
            }

            crate::readiness_event!(
                debug,
                "inventory_absent",
                phase = ReadinessPhase::Inventory,
                instance = instance,
                attempt = attempts,
                remaining_ms = clock.remaining().as_millis(),
            );

            if !ticker.tick().await {
                return Err(InventoryError::Cancelled {
                    instance: instance.clone(),
                });
            }
        }
    }
}
