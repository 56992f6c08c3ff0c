use super::outcome::InventoryError;
use super::state::ReadinessPhase;
use crate::domain::InstanceId;
use std::fmt;
use std::time::Duration;

/// Progress notifications emitted while waiting.
#[derive(Clone, Copy, Debug)]
pub enum ReadinessEvent<'a> {
    WaitStarted {
        timeout: Duration,
        instances: &'a [InstanceId],
    },
    AllOnline {
        instances: &'a [InstanceId],
        rounds: u32,
    },
    InventoryPresent {
        instance: &'a InstanceId,
    },
    InventoryFailed {
        instance: &'a InstanceId,
        error: &'a InventoryError,
    },
}

impl ReadinessEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            ReadinessEvent::WaitStarted { .. } => "wait_started",
            ReadinessEvent::AllOnline { .. } => "all_online",
            ReadinessEvent::InventoryPresent { .. } => "inventory_present",
            ReadinessEvent::InventoryFailed { .. } => "inventory_failed",
        }
    }

    pub fn phase(&self) -> ReadinessPhase {
        match self {
            ReadinessEvent::WaitStarted { .. } | ReadinessEvent::AllOnline { .. } => {
                ReadinessPhase::Status
            }
            ReadinessEvent::InventoryPresent { .. } | ReadinessEvent::InventoryFailed { .. } => {
                ReadinessPhase::Inventory
            }
        }
    }
}

struct IdList<'a>(&'a [InstanceId]);

impl fmt::Display for IdList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, id) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            f.write_str(id.as_str())?;
        }
        f.write_str("]")
    }
}

impl fmt::Display for ReadinessEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessEvent::WaitStarted { timeout, .. } => write!(
                f,
                "Waiting up to {} seconds for instances to become available",
                timeout.as_secs()
            ),
            ReadinessEvent::AllOnline { instances, .. } => {
                write!(f, "All instances ready: {}", IdList(instances))
            }
            ReadinessEvent::InventoryPresent { instance } => {
                write!(f, "Instance {instance} present in inventory")
            }
            ReadinessEvent::InventoryFailed { instance, error } => {
                write!(f, "Instance {instance} inventory check failed: {error}")
            }
        }
    }
}

/// Receives readiness progress; injected into the orchestrator.
pub trait ReadinessObserver: Send + Sync {
    fn observe(&self, event: &ReadinessEvent<'_>);
}

/// Default observer writing each event to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

pub(crate) static TRACING_OBSERVER: TracingObserver = TracingObserver;

impl ReadinessObserver for TracingObserver {
    fn observe(&self, event: &ReadinessEvent<'_>) {
        match event {
            ReadinessEvent::InventoryFailed { instance, .. } => crate::readiness_event!(
                warn,
                event.name(),
                phase = event.phase(),
                instance = instance,
                detail = event,
            ),
            ReadinessEvent::InventoryPresent { instance } => crate::readiness_event!(
                info,
                event.name(),
                phase = event.phase(),
                instance = instance,
                detail = event,
            ),
            _ => crate::readiness_event!(info, event.name(), phase = event.phase(), detail = event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_read_like_progress_messages() {
        let ids = [InstanceId::from("i-1"), InstanceId::from("i-2")];
        let started = ReadinessEvent::WaitStarted {
            timeout: Duration::from_secs(300),
            instances: &ids,
        };
        assert_eq!(
            started.to_string(),
            "Waiting up to 300 seconds for instances to become available"
        );

        let online = ReadinessEvent::AllOnline {
            instances: &ids,
            rounds: 2,
        };
        assert_eq!(online.to_string(), "All instances ready: [i-1 i-2]");
        assert_eq!(online.phase(), ReadinessPhase::Status);
    }
}
