use super::inventory::InventoryPresencePoller;
use super::observer::{ReadinessEvent, ReadinessObserver, TRACING_OBSERVER};
use super::outcome::{
    InventoryAggregateError, InventoryError, ReadinessError, ReadyToken, TokenSource,
    UnixSecondsTokens,
};
use super::request::ReadinessRequest;
use super::state::{ReadinessPhase, ReadinessState, ReadinessStateMachine};
use super::status::{StatusPoller, StatusReport};
use crate::control_plane::{InventoryQuerier, StatusLister};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

static UNIX_SECONDS_TOKENS: UnixSecondsTokens = UnixSecondsTokens;

/// Runs the two-phase readiness wait: every instance online, then each instance present in
/// inventory, one at a time.
pub struct ReadinessOrchestrator<'a> {
    status: &'a dyn StatusLister,
    inventory: &'a dyn InventoryQuerier,
    observer: &'a dyn ReadinessObserver,
    tokens: &'a dyn TokenSource,
    shutdown: CancellationToken,
}

impl<'a> ReadinessOrchestrator<'a> {
    pub fn new(status: &'a dyn StatusLister, inventory: &'a dyn InventoryQuerier) -> Self {
        Self {
            status,
            inventory,
            observer: &TRACING_OBSERVER,
            tokens: &UNIX_SECONDS_TOKENS,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn ReadinessObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_token_source(mut self, tokens: &'a dyn TokenSource) -> Self {
        self.tokens = tokens;
        self
    }

    /// Token consulted between polls; cancelling it ends the wait with `Cancelled`.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub async fn wait(&self, request: &ReadinessRequest) -> Result<ReadyToken, ReadinessError> {
        let instances = request.instance_ids();
        let mut machine = ReadinessStateMachine::new(instances.len());
        let started = Instant::now();

        let result = self.run_phases(request, &mut machine).await;
        let terminal = match &result {
            Ok(_) => ReadinessState::Ready,
            Err(err) => err.terminal_state(),
        };
        transition(&mut machine, terminal);

        let elapsed = started.elapsed();
        let duration_ms = std::cmp::min(elapsed.as_millis(), u128::from(u64::MAX)) as u64;
        match result {
            Ok((token, report)) => {
                crate::readiness_event!(
                    info,
                    "wait_completed",
                    phase = ReadinessPhase::Inventory,
                    token = token,
                    instances = instances.len(),
                    status_rounds = report.rounds,
                    duration_ms = duration_ms,
                );
                Ok(token)
            }
            Err(err) => {
                crate::readiness_event!(
                    error,
                    "wait_failed",
                    phase = err.phase(),
                    state = machine.state().as_str(),
                    error = err,
                    duration_ms = duration_ms,
                );
                Err(err)
            }
        }
    }

    async fn run_phases(
        &self,
        request: &ReadinessRequest,
        machine: &mut ReadinessStateMachine,
    ) -> Result<(ReadyToken, StatusReport), ReadinessError> {
        let instances = request.instance_ids();
        let policy = request.status_policy();
        if policy.interval_exceeds_timeout() {
            crate::readiness_event!(
                warn,
                "interval_exceeds_timeout",
                phase = ReadinessPhase::Status,
                interval_secs = policy.interval.as_secs(),
                timeout_secs = policy.timeout.as_secs(),
            );
        }

        let report = StatusPoller::new(self.status, self.observer, self.shutdown.clone())
            .wait_all_online(instances, policy)
            .await?;
        transition(machine, ReadinessState::AllOnline);

        let poller =
            InventoryPresencePoller::new(self.inventory, self.observer, self.shutdown.clone());
        let mut failures = Vec::new();
        for (index, instance) in instances.iter().enumerate() {
            transition(machine, ReadinessState::CheckingInventory(index));
            match poller.wait_present(instance).await {
                Ok(attempts) => crate::readiness_event!(
                    debug,
                    "inventory_confirmed",
                    phase = ReadinessPhase::Inventory,
                    instance = instance,
                    attempts = attempts,
                ),
                Err(InventoryError::Cancelled { .. }) => {
                    return Err(ReadinessError::Cancelled {
                        phase: ReadinessPhase::Inventory,
                        failures,
                    });
                }
                Err(error) => {
                    self.observer.observe(&ReadinessEvent::InventoryFailed {
                        instance,
                        error: &error,
                    });
                    failures.push(error);
                }
            }
        }

        if !failures.is_empty() {
            return Err(InventoryAggregateError { failures }.into());
        }
        Ok((self.tokens.issue(), report))
    }
}

fn transition(machine: &mut ReadinessStateMachine, next: ReadinessState) {
    let from = machine.state().as_str();
    let current_phase = machine.state().phase();
    match machine.advance(next) {
        Ok(state) => crate::readiness_event!(
            debug,
            "state_changed",
            phase = state.phase(),
            state_from = from,
            state_to = state.as_str(),
        ),
        Err(err) => crate::readiness_event!(
            warn,
            "transition_rejected",
            phase = current_phase,
            error = err,
        ),
    }
}
