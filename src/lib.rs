#![allow(clippy::result_large_err)]

pub mod config;
pub mod control_plane;
pub mod domain;
pub mod error;
pub mod logging;
pub mod readiness;
pub mod runtime;
pub mod telemetry;

pub use control_plane::{ControlPlaneError, InventoryQuerier, StatusLister, StatusPage};
pub use domain::{InstanceId, InstanceStatus, InventoryEntry, InventoryFilter};
pub use readiness::{ReadinessError, ReadinessOrchestrator, ReadinessRequest, ReadyToken};
