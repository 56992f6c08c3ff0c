use crate::domain::InstanceId;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadinessPhase {
    Status,
    Inventory,
}

impl ReadinessPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadinessPhase::Status => "status",
            ReadinessPhase::Inventory => "inventory",
        }
    }
}

impl fmt::Display for ReadinessPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadinessState {
    Waiting,
    AllOnline,
    CheckingInventory(usize),
    Ready,
    TimedOut {
        phase: ReadinessPhase,
        instance: Option<InstanceId>,
    },
    ApiFailure {
        phase: ReadinessPhase,
        instance: Option<InstanceId>,
    },
    Cancelled {
        phase: ReadinessPhase,
    },
}

impl ReadinessState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessState::Waiting => "WAITING",
            ReadinessState::AllOnline => "ALL_ONLINE",
            ReadinessState::CheckingInventory(_) => "CHECKING_INVENTORY",
            ReadinessState::Ready => "READY",
            ReadinessState::TimedOut { .. } => "TIMED_OUT",
            ReadinessState::ApiFailure { .. } => "API_FAILURE",
            ReadinessState::Cancelled { .. } => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReadinessState::Ready
                | ReadinessState::TimedOut { .. }
                | ReadinessState::ApiFailure { .. }
                | ReadinessState::Cancelled { .. }
        )
    }

    pub fn phase(&self) -> ReadinessPhase {
        match self {
            ReadinessState::Waiting => ReadinessPhase::Status,
            ReadinessState::AllOnline
            | ReadinessState::CheckingInventory(_)
            | ReadinessState::Ready => ReadinessPhase::Inventory,
            ReadinessState::TimedOut { phase, .. }
            | ReadinessState::ApiFailure { phase, .. }
            | ReadinessState::Cancelled { phase } => *phase,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionError {
    InvalidTransition {
        from: ReadinessState,
        to: ReadinessState,
    },
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::InvalidTransition { from, to } => write!(
                f,
                "invalid readiness transition {} -> {}",
                from.as_str(),
                to.as_str()
            ),
        }
    }
}

impl std::error::Error for TransitionError {}

/// Tracks the wait through its phases for `instance_count` instances.
///
/// Only forward moves are accepted; re-polling inside a state is not a transition.
#[derive(Debug)]
pub struct ReadinessStateMachine {
    state: ReadinessState,
    instance_count: usize,
}

impl ReadinessStateMachine {
    pub fn new(instance_count: usize) -> Self {
        Self {
            state: ReadinessState::Waiting,
            instance_count,
        }
    }

    pub fn state(&self) -> &ReadinessState {
        &self.state
    }

    pub fn advance(&mut self, next: ReadinessState) -> Result<&ReadinessState, TransitionError> {
        if !self.is_valid_transition(&next) {
            return Err(TransitionError::InvalidTransition {
                from: self.state.clone(),
                to: next,
            });
        }

        self.state = next;
        Ok(&self.state)
    }

    fn is_valid_transition(&self, next: &ReadinessState) -> bool {
        let last = self.instance_count.saturating_sub(1);
        match (&self.state, next) {
            (current, _) if current.is_terminal() => false,
            (ReadinessState::Waiting, ReadinessState::AllOnline) => true,
            (ReadinessState::AllOnline, ReadinessState::CheckingInventory(0)) => {
                self.instance_count > 0
            }
            (ReadinessState::AllOnline, ReadinessState::Ready) => self.instance_count == 0,
            (ReadinessState::CheckingInventory(current), ReadinessState::CheckingInventory(n)) => {
                *n == current + 1 && *n <= last
            }
            (ReadinessState::CheckingInventory(current), ReadinessState::Ready) => {
                *current == last
            }
            (current, ReadinessState::TimedOut { phase, .. })
            | (current, ReadinessState::ApiFailure { phase, .. })
            | (current, ReadinessState::Cancelled { phase }) => current.phase() == *phase,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_happy_path_for_three_instances() {
        let mut machine = ReadinessStateMachine::new(3);
        machine.advance(ReadinessState::AllOnline).expect("online");
        for index in 0..3 {
            machine
                .advance(ReadinessState::CheckingInventory(index))
                .expect("next instance");
        }
        assert_eq!(
            machine.advance(ReadinessState::Ready).expect("ready"),
            &ReadinessState::Ready
        );
    }

    #[test]
    fn rejects_skipping_instances_and_going_back() {
        let mut machine = ReadinessStateMachine::new(3);
        machine.advance(ReadinessState::AllOnline).expect("online");
        machine
            .advance(ReadinessState::CheckingInventory(0))
            .expect("first");

        assert!(machine
            .advance(ReadinessState::CheckingInventory(2))
            .is_err());
        assert!(machine.advance(ReadinessState::Waiting).is_err());
        assert!(machine.advance(ReadinessState::Ready).is_err());
    }

    #[test]
    fn failures_must_match_current_phase() {
        let mut machine = ReadinessStateMachine::new(1);
        let inventory_timeout = ReadinessState::TimedOut {
            phase: ReadinessPhase::Inventory,
            instance: Some(InstanceId::from("i-1")),
        };
        assert!(machine.advance(inventory_timeout).is_err());

        machine
            .advance(ReadinessState::TimedOut {
                phase: ReadinessPhase::Status,
                instance: None,
            })
            .expect("status timeout");
        assert!(machine.state().is_terminal());
        assert!(machine.advance(ReadinessState::AllOnline).is_err());
    }
}
