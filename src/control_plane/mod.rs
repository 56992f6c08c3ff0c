//! Typed capabilities the readiness wait needs from the fleet-management control plane.
//!
//! The real client lives outside this crate; anything that can list instance statuses page
//! by page and query inventory by instance id can drive the wait.

pub mod scripted;

use crate::domain::{InstanceStatus, InventoryEntry, InventoryFilter};
use async_trait::async_trait;
use futures_util::stream::{self, Stream};
use thiserror::Error;

pub use scripted::{ControlPlaneScript, InventoryAnswer, ScriptedControlPlane, StatusRoundScript};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ControlPlaneError {
    #[error("{operation} request failed: {message}")]
    Request {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} request was throttled")]
    Throttled { operation: &'static str },
}

impl ControlPlaneError {
    pub fn request(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Request {
            operation,
            message: message.into(),
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            ControlPlaneError::Request { operation, .. }
            | ControlPlaneError::Throttled { operation } => operation,
        }
    }
}

/// One page of the instance status listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusPage {
    pub records: Vec<InstanceStatus>,
    pub next_token: Option<String>,
}

impl StatusPage {
    pub fn last(records: Vec<InstanceStatus>) -> Self {
        Self {
            records,
            next_token: None,
        }
    }

    pub fn with_next(records: Vec<InstanceStatus>, next_token: impl Into<String>) -> Self {
        Self {
            records,
            next_token: Some(next_token.into()),
        }
    }
}

/// Lists every instance known to the control plane, unfiltered, one page at a time.
#[async_trait]
pub trait StatusLister: Send + Sync {
    async fn list_status_page(
        &self,
        next_token: Option<&str>,
    ) -> Result<StatusPage, ControlPlaneError>;
}

/// Queries the inventory subsystem for entities matching a filter.
#[async_trait]
pub trait InventoryQuerier: Send + Sync {
    async fn query_inventory(
        &self,
        filter: &InventoryFilter,
    ) -> Result<Vec<InventoryEntry>, ControlPlaneError>;
}

enum PageCursor {
    Start,
    Next(String),
    Done,
}

/// Lazy sequence over every page of the status listing.
///
/// Each call starts from the first page; nothing is shared between sequences. The stream ends
/// after the page that carries no continuation token and yields the first error it hits.
pub fn status_pages<'a, L>(
    lister: &'a L,
) -> impl Stream<Item = Result<StatusPage, ControlPlaneError>> + Send + 'a
where
    L: StatusLister + ?Sized,
{
    stream::try_unfold(PageCursor::Start, move |cursor| async move {
        let token = match cursor {
            PageCursor::Start => None,
            PageCursor::Next(token) => Some(token),
            PageCursor::Done => return Ok(None),
        };

        let page = lister.list_status_page(token.as_deref()).await?;
        let next = match page.next_token.clone() {
            Some(token) => PageCursor::Next(token),
            None => PageCursor::Done,
        };
        Ok::<_, ControlPlaneError>(Some((page, next)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;
    use std::sync::Mutex;

    struct TwoPages {
        calls: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl StatusLister for TwoPages {
        async fn list_status_page(
            &self,
            next_token: Option<&str>,
        ) -> Result<StatusPage, ControlPlaneError> {
            self.calls
                .lock()
                .expect("calls")
                .push(next_token.map(str::to_string));
            match next_token {
                None => Ok(StatusPage::with_next(
                    vec![InstanceStatus::online("i-1")],
                    "page-2",
                )),
                Some("page-2") => Ok(StatusPage::last(vec![InstanceStatus::online("i-2")])),
                Some(other) => Err(ControlPlaneError::request(
                    "DescribeInstanceInformation",
                    format!("unknown token {other}"),
                )),
            }
        }
    }

    #[tokio::test]
    async fn pages_are_consumed_until_no_token_remains() {
        let lister = TwoPages {
            calls: Mutex::new(Vec::new()),
        };

        let pages: Vec<StatusPage> = status_pages(&lister).try_collect().await.expect("pages");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].records[0].instance_id, "i-2");

        let again: Vec<StatusPage> = status_pages(&lister).try_collect().await.expect("pages");
        assert_eq!(again.len(), 2, "each sequence restarts from the first page");

        let calls = lister.calls.lock().expect("calls").clone();
        assert_eq!(
            calls,
            vec![None, Some("page-2".to_string()), None, Some("page-2".to_string())]
        );
    }
}
