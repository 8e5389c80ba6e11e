//! Intake stage: claim one ready work item.

use std::sync::Arc;

use async_trait::async_trait;
use gantry_core::{names, CoreResult, PipelineState, Stage, StateDelta, Status};
use gantry_tracker::{TicketClient, DEFAULT_IN_PROGRESS_STATUS};
use tracing::{info, warn};

/// Picks the first ready work item and marks it in progress.
pub struct IntakeStage {
    tracker: Arc<dyn TicketClient>,
    in_progress_status: String,
}

impl IntakeStage {
    pub fn new(tracker: Arc<dyn TicketClient>) -> Self {
        Self {
            tracker,
            in_progress_status: DEFAULT_IN_PROGRESS_STATUS.to_string(),
        }
    }

    pub fn with_in_progress_status(mut self, status: impl Into<String>) -> Self {
        self.in_progress_status = status.into();
        self
    }
}

#[async_trait]
impl Stage for IntakeStage {
    fn name(&self) -> &str {
        names::INTAKE
    }

    fn description(&self) -> &str {
        "Claims the first ready work item from the tracker"
    }

    async fn execute(&self, _state: &PipelineState) -> CoreResult<StateDelta> {
        let items = self
            .tracker
            .fetch_ready()
            .await
            .map_err(|e| gantry_core::CoreError::stage(names::INTAKE, e))?;

        let Some(item) = items.into_iter().next() else {
            info!("No ready work items");
            return Ok(StateDelta::status(Status::Idle));
        };

        info!("Claiming work item {}: {}", item.id, item.title);
        match self
            .tracker
            .update_status(&item.id, &self.in_progress_status)
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(
                "Tracker refused to move {} to '{}', continuing",
                item.id, self.in_progress_status
            ),
            Err(e) => warn!("Tracker update for {} failed, continuing: {}", item.id, e),
        }

        Ok(StateDelta::status(Status::Working)
            .with_task(item.render_task())
            .with_ticket(item.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::CoreError;
    use gantry_tracker::{InMemoryTracker, WorkItem};

    #[tokio::test]
    async fn test_no_ready_items_is_idle() {
        let stage = IntakeStage::new(Arc::new(InMemoryTracker::new()));

        let delta = stage.execute(&PipelineState::new()).await.unwrap();

        assert_eq!(delta.status, Some(Status::Idle));
        assert!(delta.task.is_none());
    }

    #[tokio::test]
    async fn test_claims_first_item() {
        let tracker = Arc::new(InMemoryTracker::with_items(vec![
            WorkItem::new("T-1", "Add X endpoint", "Expose X"),
            WorkItem::new("T-2", "Other", ""),
        ]));
        let stage = IntakeStage::new(tracker.clone());

        let delta = stage.execute(&PipelineState::new()).await.unwrap();

        assert_eq!(delta.status, Some(Status::Working));
        assert_eq!(delta.ticket_id.as_deref(), Some("T-1"));
        assert_eq!(delta.task.as_deref(), Some("Add X endpoint\n\nExpose X"));
        assert_eq!(
            tracker.updates(),
            vec![("T-1".to_string(), "in_progress".to_string())]
        );
    }

    #[tokio::test]
    async fn test_refused_claim_still_proceeds() {
        let tracker = Arc::new(InMemoryTracker::with_items(vec![WorkItem::new(
            "T-1", "Add X", "",
        )]));
        tracker.refuse_updates_for("T-1");
        let stage = IntakeStage::new(tracker).with_in_progress_status("doing");

        let delta = stage.execute(&PipelineState::new()).await.unwrap();

        assert_eq!(delta.status, Some(Status::Working));
        assert_eq!(delta.ticket_id.as_deref(), Some("T-1"));
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts() {
        let stage = IntakeStage::new(Arc::new(InMemoryTracker::new().failing_fetch()));

        let result = stage.execute(&PipelineState::new()).await;

        assert!(matches!(result, Err(CoreError::StageFailed { .. })));
    }
}
