use super::observer::{ReadinessEvent, ReadinessObserver};
use super::outcome::ReadinessError;
use super::policy::PollPolicy;
use super::state::ReadinessPhase;
use crate::control_plane::{status_pages, StatusLister};
use crate::domain::{InstanceId, InstanceStatus};
use crate::runtime::PollTicker;
use futures_util::{pin_mut, TryStreamExt};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Online flags for the requested instances during a single round.
#[derive(Debug)]
pub struct ReadinessSet<'a> {
    requested: &'a [InstanceId],
    online: HashMap<&'a str, bool>,
}

impl<'a> ReadinessSet<'a> {
    pub fn new(requested: &'a [InstanceId]) -> Self {
        let online = requested.iter().map(|id| (id.as_str(), false)).collect();
        Self { requested, online }
    }

    /// Marks the record's instance online if it was requested and reports `Online`.
    pub fn observe(&mut self, record: &InstanceStatus) {
        if !record.is_online() {
            return;
        }
        if let Some(flag) = self.online.get_mut(record.instance_id.as_str()) {
            *flag = true;
        }
    }

    pub fn is_online(&self, instance: &str) -> bool {
        self.online.get(instance).copied().unwrap_or(false)
    }

    pub fn all_online(&self) -> bool {
        self.requested.iter().all(|id| self.is_online(id.as_str()))
    }

    pub fn pending(&self) -> Vec<&'a InstanceId> {
        self.requested
            .iter()
            .filter(|id| !self.is_online(id.as_str()))
            .collect()
    }
}

/// Successful end of the status phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusReport {
    pub rounds: u32,
}

/// Polls the paginated status listing until every requested instance reports online.
pub struct StatusPoller<'a> {
    lister: &'a dyn StatusLister,
    observer: &'a dyn ReadinessObserver,
    shutdown: CancellationToken,
}

impl<'a> StatusPoller<'a> {
    pub fn new(
        lister: &'a dyn StatusLister,
        observer: &'a dyn ReadinessObserver,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            lister,
            observer,
            shutdown,
        }
    }

    /// Runs one full pass over every page and returns the resulting flags.
    pub async fn poll_round<'r>(
        &self,
        requested: &'r [InstanceId],
    ) -> Result<ReadinessSet<'r>, ReadinessError> {
        let mut set = ReadinessSet::new(requested);
        let pages = status_pages(self.lister);
        pin_mut!(pages);

        while let Some(page) = pages
            .try_next()
            .await
            .map_err(|source| ReadinessError::StatusApi { source })?
        {
            for record in &page.records {
                set.observe(record);
            }
        }

        Ok(set)
    }

    /// Waits until every id is online, the deadline passes, or the wait is cancelled.
    ///
    /// The deadline is checked before each round, so an expired budget never issues a poll.
    pub async fn wait_all_online(
        &self,
        instances: &[InstanceId],
        policy: PollPolicy,
    ) -> Result<StatusReport, ReadinessError> {
        self.observer.observe(&ReadinessEvent::WaitStarted {
            timeout: policy.timeout,
            instances,
        });

        let clock = policy.start_clock();
        let ticker = PollTicker::new(policy.interval, self.shutdown.clone());
        let mut rounds = 0u32;

        loop {
            if ticker.is_cancelled() {
                return Err(ReadinessError::Cancelled {
                    phase: ReadinessPhase::Status,
                    failures: Vec::new(),
                });
            }
            if clock.expired() {
                crate::readiness_event!(
                    warn,
                    "status_timeout",
                    phase = ReadinessPhase::Status,
                    rounds = rounds,
                    elapsed_ms = clock.elapsed().as_millis(),
                );
                return Err(ReadinessError::StatusTimeout {
                    timeout: policy.timeout,
                    rounds,
                });
            }

            rounds += 1;
            let set = self.poll_round(instances).await?;
            if set.all_online() {
                self.observer.observe(&ReadinessEvent::AllOnline { instances, rounds });
                return Ok(StatusReport { rounds });
            }

            let pending = set.pending();
            let pending_ids: Vec<&str> = pending.iter().map(|id| id.as_str()).collect();
            crate::readiness_event!(
                debug,
                "status_round",
                phase = ReadinessPhase::Status,
                round = rounds,
                online = instances.len() - pending.len(),
                pending = pending_ids.join(","),
            );

            if !ticker.tick().await {
                return Err(ReadinessError::Cancelled {
                    phase: ReadinessPhase::Status,
                    failures: Vec::new(),
                });
            }
        }
    }
}
