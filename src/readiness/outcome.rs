use super::state::{ReadinessPhase, ReadinessState};
use crate::control_plane::ControlPlaneError;
use crate::domain::InstanceId;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const TOKEN_PREFIX: &str = "ssm-ready-";

/// Identifier handed back once every instance is ready: `ssm-ready-<unix-seconds>`.
///
/// Two waits finishing within the same second produce the same token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReadyToken(String);

impl ReadyToken {
    pub fn from_unix_seconds(seconds: i64) -> Self {
        Self(format!("{TOKEN_PREFIX}{seconds}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn unix_seconds(&self) -> Option<i64> {
        self.0.strip_prefix(TOKEN_PREFIX)?.parse().ok()
    }
}

impl fmt::Display for ReadyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of success tokens; swap in a custom one for stronger uniqueness or fixed output.
pub trait TokenSource: Send + Sync {
    fn issue(&self) -> ReadyToken;
}

/// Issues tokens from the current wall-clock second.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnixSecondsTokens;

impl TokenSource for UnixSecondsTokens {
    fn issue(&self) -> ReadyToken {
        ReadyToken::from_unix_seconds(chrono::Utc::now().timestamp())
    }
}

/// Failure of the inventory wait for one instance.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("instance `{instance}` did not appear in inventory within {timeout:?}")]
    Timeout {
        instance: InstanceId,
        timeout: Duration,
    },
    #[error("inventory query failed for instance `{instance}`: {source}")]
    Api {
        instance: InstanceId,
        #[source]
        source: ControlPlaneError,
    },
    #[error("inventory wait for instance `{instance}` was cancelled")]
    Cancelled { instance: InstanceId },
}

impl InventoryError {
    pub fn instance(&self) -> &InstanceId {
        match self {
            InventoryError::Timeout { instance, .. }
            | InventoryError::Api { instance, .. }
            | InventoryError::Cancelled { instance } => instance,
        }
    }

    fn terminal_state(&self) -> ReadinessState {
        let phase = ReadinessPhase::Inventory;
        match self {
            InventoryError::Timeout { instance, .. } => ReadinessState::TimedOut {
                phase,
                instance: Some(instance.clone()),
            },
            InventoryError::Api { instance, .. } => ReadinessState::ApiFailure {
                phase,
                instance: Some(instance.clone()),
            },
            InventoryError::Cancelled { .. } => ReadinessState::Cancelled { phase },
        }
    }
}

/// Every instance whose inventory wait failed, in request order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventoryAggregateError {
    pub failures: Vec<InventoryError>,
}

impl fmt::Display for InventoryAggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "inventory check failed for {} instance(s)",
            self.failures.len()
        )?;
        for failure in &self.failures {
            writeln!(f, "  {}: {}", failure.instance(), failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for InventoryAggregateError {}

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("timeout of {timeout:?} exceeded while waiting for instances to report online (after {rounds} round(s))")]
    StatusTimeout { timeout: Duration, rounds: u32 },
    #[error("error describing instance information: {source}")]
    StatusApi {
        #[source]
        source: ControlPlaneError,
    },
    #[error(transparent)]
    Inventory(#[from] InventoryAggregateError),
    #[error("readiness wait cancelled during {phase} phase{}", failed_before_cancel(.failures))]
    Cancelled {
        phase: ReadinessPhase,
        /// Inventory failures already recorded when the wait was cancelled.
        failures: Vec<InventoryError>,
    },
}

fn failed_before_cancel(failures: &[InventoryError]) -> String {
    if failures.is_empty() {
        return String::new();
    }
    let ids: Vec<&str> = failures.iter().map(|f| f.instance().as_str()).collect();
    format!(" (already failed: {})", ids.join(", "))
}

impl ReadinessError {
    pub fn phase(&self) -> ReadinessPhase {
        match self {
            ReadinessError::StatusTimeout { .. } | ReadinessError::StatusApi { .. } => {
                ReadinessPhase::Status
            }
            ReadinessError::Inventory(_) => ReadinessPhase::Inventory,
            ReadinessError::Cancelled { phase, .. } => *phase,
        }
    }

    /// State the wait ends in for this failure; for inventory failures the first failing
    /// instance decides.
    pub fn terminal_state(&self) -> ReadinessState {
        match self {
            ReadinessError::StatusTimeout { .. } => ReadinessState::TimedOut {
                phase: ReadinessPhase::Status,
                instance: None,
            },
            ReadinessError::StatusApi { .. } => ReadinessState::ApiFailure {
                phase: ReadinessPhase::Status,
                instance: None,
            },
            ReadinessError::Inventory(aggregate) => aggregate
                .failures
                .first()
                .map(InventoryError::terminal_state)
                .unwrap_or(ReadinessState::TimedOut {
                    phase: ReadinessPhase::Inventory,
                    instance: None,
                }),
            ReadinessError::Cancelled { phase, .. } => {
                ReadinessState::Cancelled { phase: *phase }
            }
        }
    }
}
