pub mod clock;
pub mod inventory;
pub mod observer;
pub mod orchestrator;
pub mod outcome;
pub mod policy;
pub mod request;
pub mod state;
pub mod status;

pub use clock::DeadlineClock;
pub use inventory::InventoryPresencePoller;
pub use observer::{ReadinessEvent, ReadinessObserver, TracingObserver};
pub use orchestrator::ReadinessOrchestrator;
pub use outcome::{
    InventoryAggregateError, InventoryError, ReadinessError, ReadyToken, TokenSource,
    UnixSecondsTokens,
};
pub use policy::{
    PollPolicy, DEFAULT_STATUS_INTERVAL, DEFAULT_STATUS_TIMEOUT, INVENTORY_INTERVAL,
    INVENTORY_TIMEOUT,
};
pub use request::{ReadinessRequest, RequestError};
pub use state::{ReadinessPhase, ReadinessState, ReadinessStateMachine, TransitionError};
pub use status::{ReadinessSet, StatusPoller, StatusReport};
