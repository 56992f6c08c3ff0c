#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Ping status the control plane reports for an agent that checked in recently.
pub const ONLINE_PING_STATUS: &str = "Online";

/// Opaque identifier of a managed instance.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for InstanceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for InstanceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InstanceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One row of the paginated status listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceStatus {
    pub instance_id: String,
    pub ping_status: String,
}

impl InstanceStatus {
    pub fn new(instance_id: impl Into<String>, ping_status: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            ping_status: ping_status.into(),
        }
    }

    pub fn online(instance_id: impl Into<String>) -> Self {
        Self::new(instance_id, ONLINE_PING_STATUS)
    }

    pub fn is_online(&self) -> bool {
        self.ping_status == ONLINE_PING_STATUS
    }
}

/// A single entity returned by the inventory query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub instance_id: String,
}

impl InventoryEntry {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
        }
    }
}

/// Exact-match filter on the inventory instance id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventoryFilter {
    pub instance_id: InstanceId,
}

impl InventoryFilter {
    pub fn instance(instance_id: &InstanceId) -> Self {
        Self {
            instance_id: instance_id.clone(),
        }
    }

    pub fn matches(&self, entry: &InventoryEntry) -> bool {
        entry.instance_id == self.instance_id.as_str()
    }
}
