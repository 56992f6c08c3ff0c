#![allow(dead_code)]

use ssm_ready::control_plane::{
    ControlPlaneScript, InventoryAnswer, ScriptedControlPlane, StatusRoundScript,
};
use ssm_ready::domain::InstanceStatus;
use ssm_ready::readiness::{ReadinessEvent, ReadinessObserver, ReadyToken, TokenSource};
use std::sync::{Arc, Mutex};

/// Observer that keeps every event as `name: line` for assertions.
#[derive(Clone, Default, Debug)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("recorded events").clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|line| line.split(':').next().unwrap_or_default().to_string())
            .collect()
    }
}

impl ReadinessObserver for RecordingObserver {
    fn observe(&self, event: &ReadinessEvent<'_>) {
        self.events
            .lock()
            .expect("recorded events")
            .push(format!("{}: {}", event.name(), event));
    }
}

/// Token source returning a fixed second, for reproducible outcomes.
pub struct FixedTokens(pub i64);

impl TokenSource for FixedTokens {
    fn issue(&self) -> ReadyToken {
        ReadyToken::from_unix_seconds(self.0)
    }
}

pub fn online(ids: &[&str]) -> Vec<InstanceStatus> {
    ids.iter().copied().map(InstanceStatus::online).collect()
}

pub fn round(ids: &[&str]) -> StatusRoundScript {
    StatusRoundScript::single_page(online(ids))
}

/// Every requested id online on the first round, present in inventory on the first query.
pub fn always_ready(ids: &[&str]) -> ScriptedControlPlane {
    let mut script = ControlPlaneScript::default().with_round(round(ids));
    for id in ids {
        script = script.with_inventory(*id, vec![InventoryAnswer::present()]);
    }
    ScriptedControlPlane::new(script)
}

pub fn is_token(value: &str) -> bool {
    regex::Regex::new(r"^ssm-ready-\d+$")
        .expect("token pattern")
        .is_match(value)
}
