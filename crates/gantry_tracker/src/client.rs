//! Tracker client trait.

use async_trait::async_trait;

use crate::error::TrackerResult;
use crate::models::WorkItem;

/// Query and update work items in an external tracker.
#[async_trait]
pub trait TicketClient: Send + Sync {
    /// Items waiting to be picked up, in tracker order.
    async fn fetch_ready(&self) -> TrackerResult<Vec<WorkItem>>;

    /// Move an item to a new status.
    ///
    /// `Ok(false)` means the tracker refused the update.
    async fn update_status(&self, id: &str, status: &str) -> TrackerResult<bool>;
}
