//! In-memory tracker for tests and dry runs.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::client::TicketClient;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{WorkItem, DEFAULT_READY_STATUS};

/// Tracker holding items in memory and recording every status update.
#[derive(Debug, Default)]
pub struct InMemoryTracker {
    items: RwLock<Vec<WorkItem>>,
    updates: RwLock<Vec<(String, String)>>,
    ready_status: String,
    /// Ids whose updates are refused with `Ok(false)`
    refuse: RwLock<HashMap<String, bool>>,
    fail_fetch: bool,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self {
            ready_status: DEFAULT_READY_STATUS.to_string(),
            ..Self::default()
        }
    }

    pub fn with_items(items: Vec<WorkItem>) -> Self {
        let tracker = Self::new();
        *tracker.items.write() = items;
        tracker
    }

    pub fn add_item(&self, item: WorkItem) {
        self.items.write().push(item);
    }

    /// Make `fetch_ready` fail.
    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    /// Refuse status updates for an item.
    pub fn refuse_updates_for(&self, id: impl Into<String>) {
        self.refuse.write().insert(id.into(), true);
    }

    /// Status updates received, in order, as (id, status).
    pub fn updates(&self) -> Vec<(String, String)> {
        self.updates.read().clone()
    }

    pub fn status_of(&self, id: &str) -> Option<String> {
        self.items
            .read()
            .iter()
            .find(|i| i.id == id)
            .map(|i| i.status.clone())
    }
}

#[async_trait]
impl TicketClient for InMemoryTracker {
    async fn fetch_ready(&self) -> TrackerResult<Vec<WorkItem>> {
        if self.fail_fetch {
            return Err(TrackerError::Request("tracker unavailable".to_string()));
        }
        Ok(self
            .items
            .read()
            .iter()
            .filter(|i| i.status == self.ready_status)
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: &str, status: &str) -> TrackerResult<bool> {
        self.updates.write().push((id.to_string(), status.to_string()));

        if self.refuse.read().contains_key(id) {
            return Ok(false);
        }

        let mut items = self.items.write();
        match items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.status = status.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_ready_filters_by_status() {
        let tracker = InMemoryTracker::with_items(vec![
            WorkItem::new("T-1", "one", ""),
            WorkItem::new("T-2", "two", "").with_status("done"),
            WorkItem::new("T-3", "three", ""),
        ]);

        let ready = tracker.fetch_ready().await.unwrap();
        let ids: Vec<&str> = ready.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["T-1", "T-3"]);
    }

    #[tokio::test]
    async fn test_update_status_records_and_applies() {
        let tracker = InMemoryTracker::with_items(vec![WorkItem::new("T-1", "one", "")]);

        assert!(tracker.update_status("T-1", "in_progress").await.unwrap());
        assert!(!tracker.update_status("missing", "in_progress").await.unwrap());

        assert_eq!(tracker.status_of("T-1").as_deref(), Some("in_progress"));
        assert_eq!(tracker.updates().len(), 2);
        assert!(tracker.fetch_ready().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refused_update() {
        let tracker = InMemoryTracker::with_items(vec![WorkItem::new("T-1", "one", "")]);
        tracker.refuse_updates_for("T-1");

        assert!(!tracker.update_status("T-1", "in_progress").await.unwrap());
        assert_eq!(tracker.status_of("T-1").as_deref(), Some("ready"));
    }

    #[tokio::test]
    async fn test_failing_fetch() {
        let tracker = InMemoryTracker::new().failing_fetch();
        assert!(tracker.fetch_ready().await.is_err());
    }
}
