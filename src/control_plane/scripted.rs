use super::{ControlPlaneError, InventoryQuerier, StatusLister, StatusPage};
use crate::domain::{InstanceStatus, InventoryEntry, InventoryFilter};
use crate::error::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

const LIST_OPERATION: &str = "DescribeInstanceInformation";
const INVENTORY_OPERATION: &str = "GetInventory";

/// Scripted responses for a dry run of the readiness wait.
///
/// ```yaml
/// status_rounds:
///   - pages:
///       - - { instance_id: i-1, ping_status: Online }
///       - - { instance_id: i-2, ping_status: ConnectionLost }
///   - error: "throttled"
/// inventory:
///   i-1:
///     - { present: false }
///     - { present: true }
/// ```
///
/// The last status round and the last inventory answer of each instance repeat once the
/// script runs out. Instances missing from `inventory` are never present.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ControlPlaneScript {
    #[serde(default)]
    pub status_rounds: Vec<StatusRoundScript>,
    #[serde(default)]
    pub inventory: BTreeMap<String, Vec<InventoryAnswer>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct StatusRoundScript {
    #[serde(default)]
    pub pages: Vec<Vec<InstanceStatus>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusRoundScript {
    pub fn pages(pages: Vec<Vec<InstanceStatus>>) -> Self {
        Self { pages, error: None }
    }

    pub fn single_page(records: Vec<InstanceStatus>) -> Self {
        Self::pages(vec![records])
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            pages: Vec::new(),
            error: Some(message.into()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct InventoryAnswer {
    #[serde(default)]
    pub present: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl InventoryAnswer {
    pub fn present() -> Self {
        Self {
            present: true,
            error: None,
        }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            present: false,
            error: Some(message.into()),
        }
    }
}

impl ControlPlaneScript {
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open control plane script `{}`", path.display()))?;
        Self::from_reader(file)
            .with_context(|| format!("failed to parse control plane script `{}`", path.display()))
    }

    pub fn with_round(mut self, round: StatusRoundScript) -> Self {
        self.status_rounds.push(round);
        self
    }

    pub fn with_inventory(
        mut self,
        instance_id: impl Into<String>,
        answers: Vec<InventoryAnswer>,
    ) -> Self {
        self.inventory.insert(instance_id.into(), answers);
        self
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    rounds_started: usize,
    page_calls: usize,
    inventory_calls: BTreeMap<String, usize>,
    inventory_log: Vec<String>,
}

/// In-memory control plane that replays a [`ControlPlaneScript`].
///
/// A request without a continuation token starts a new status round.
#[derive(Debug)]
pub struct ScriptedControlPlane {
    script: ControlPlaneScript,
    state: Mutex<ScriptState>,
}

impl ScriptedControlPlane {
    pub fn new(script: ControlPlaneScript) -> Self {
        Self {
            script,
            state: Mutex::new(ScriptState::default()),
        }
    }

    /// Number of listing sequences started (one per status round).
    pub fn status_rounds(&self) -> usize {
        self.lock_state().rounds_started
    }

    /// Number of individual page requests across all rounds.
    pub fn page_calls(&self) -> usize {
        self.lock_state().page_calls
    }

    /// Instance ids in the order the inventory was queried.
    pub fn inventory_log(&self) -> Vec<String> {
        self.lock_state().inventory_log.clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn round_script(&self, round: usize) -> Option<&StatusRoundScript> {
        let rounds = &self.script.status_rounds;
        rounds.get(round).or_else(|| rounds.last())
    }
}

fn page_index(token: Option<&str>) -> std::result::Result<usize, ControlPlaneError> {
    match token {
        None => Ok(0),
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            ControlPlaneError::request(LIST_OPERATION, format!("invalid next token `{raw}`"))
        }),
    }
}

#[async_trait]
impl StatusLister for ScriptedControlPlane {
    async fn list_status_page(
        &self,
        next_token: Option<&str>,
    ) -> std::result::Result<StatusPage, ControlPlaneError> {
        let index = page_index(next_token)?;
        let round = {
            let mut state = self.lock_state();
            if next_token.is_none() {
                state.rounds_started += 1;
            }
            state.page_calls += 1;
            state.rounds_started.saturating_sub(1)
        };

        let Some(script) = self.round_script(round) else {
            return Ok(StatusPage::default());
        };
        if let Some(message) = &script.error {
            return Err(ControlPlaneError::request(LIST_OPERATION, message.clone()));
        }

        let records = script.pages.get(index).cloned().unwrap_or_default();
        if index + 1 < script.pages.len() {
            Ok(StatusPage::with_next(records, (index + 1).to_string()))
        } else {
            Ok(StatusPage::last(records))
        }
    }
}

#[async_trait]
impl InventoryQuerier for ScriptedControlPlane {
    async fn query_inventory(
        &self,
        filter: &InventoryFilter,
    ) -> std::result::Result<Vec<InventoryEntry>, ControlPlaneError> {
        let id = filter.instance_id.as_str();
        let call = {
            let mut state = self.lock_state();
            state.inventory_log.push(id.to_string());
            let counter = state.inventory_calls.entry(id.to_string()).or_insert(0);
            let call = *counter;
            *counter += 1;
            call
        };

        let answer = self
            .script
            .inventory
            .get(id)
            .and_then(|answers| answers.get(call).or_else(|| answers.last()));

        match answer {
            Some(InventoryAnswer {
                error: Some(message),
                ..
            }) => Err(ControlPlaneError::request(
                INVENTORY_OPERATION,
                message.clone(),
            )),
            Some(InventoryAnswer { present: true, .. }) => Ok(vec![InventoryEntry::new(id)]),
            _ => Ok(Vec::new()),
        }
    }
}
