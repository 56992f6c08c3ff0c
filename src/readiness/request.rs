use super::policy::PollPolicy;
use crate::domain::InstanceId;
use std::time::Duration;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("at least one instance id is required")]
    NoInstances,
    #[error("instance id at position {position} is empty")]
    EmptyInstanceId { position: usize },
}

/// Instances to gate on plus the status-phase timing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadinessRequest {
    instance_ids: Vec<InstanceId>,
    status: PollPolicy,
}

impl ReadinessRequest {
    pub fn new<I, T>(instance_ids: I) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = T>,
        T: Into<InstanceId>,
    {
        let instance_ids: Vec<InstanceId> = instance_ids.into_iter().map(Into::into).collect();
        if instance_ids.is_empty() {
            return Err(RequestError::NoInstances);
        }
        if let Some(position) = instance_ids.iter().position(|id| id.as_str().is_empty()) {
            return Err(RequestError::EmptyInstanceId { position });
        }

        Ok(Self {
            instance_ids,
            status: PollPolicy::default(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.status.timeout = timeout;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.status.interval = interval;
        self
    }

    pub fn instance_ids(&self) -> &[InstanceId] {
        &self.instance_ids
    }

    pub fn status_policy(&self) -> PollPolicy {
        self.status
    }
}
