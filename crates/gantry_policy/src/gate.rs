//! Quality gate stage.
//!
//! Runs the static-check command, then the test command, through a
//! [`CommandRunner`]. A failure produces a tagged [`FailureReport`] that
//! drives the repair loop; success optionally hands the ticket over to
//! review in the tracker.

use std::sync::Arc;

use async_trait::async_trait;
use gantry_core::{
    names, truncate_for_log, CoreResult, FailureKind, PipelineState, Stage, StateDelta, Status,
};
use gantry_runner::CommandRunner;
use gantry_tracker::TicketClient;
use tracing::{debug, info, warn};

use crate::check::{CheckResult, GateEvaluation};
use crate::config::GateConfig;

/// Runs the gate checks in order.
pub struct GateEvaluator {
    runner: Arc<dyn CommandRunner>,
    config: GateConfig,
}

impl GateEvaluator {
    pub fn new(runner: Arc<dyn CommandRunner>, config: GateConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    async fn check(&self, kind: FailureKind, command: &str) -> CheckResult {
        info!("Running {} check: {}", kind, command);
        let result = match self.runner.run(command).await {
            Ok(output) => CheckResult::from_output(kind, &output),
            Err(e) => {
                warn!("{} check could not run: {}", kind, e);
                CheckResult::from_runner_error(kind, command, &e)
            }
        };

        if result.passed {
            info!("{} check passed ({}ms)", kind, result.duration_ms);
        } else {
            warn!(
                "{} check failed: {}",
                kind,
                truncate_for_log(&result.output, 500)
            );
        }
        result
    }

    /// Lint, then tests unless lint failed.
    pub async fn evaluate(&self) -> GateEvaluation {
        let mut evaluation = GateEvaluation::new();

        let lint = self.check(FailureKind::Lint, &self.config.lint_command).await;
        let lint_passed = lint.passed;
        evaluation.push(lint);
        if !lint_passed {
            return evaluation;
        }

        let test = self.check(FailureKind::Test, &self.config.test_command).await;
        evaluation.push(test);
        evaluation
    }
}

/// Pipeline stage wrapping a [`GateEvaluator`].
pub struct QualityGateStage {
    evaluator: GateEvaluator,
    tracker: Option<Arc<dyn TicketClient>>,
}

impl QualityGateStage {
    pub fn new(evaluator: GateEvaluator) -> Self {
        Self {
            evaluator,
            tracker: None,
        }
    }

    /// Move approved tickets to the approval status in this tracker.
    pub fn with_tracker(mut self, tracker: Arc<dyn TicketClient>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    async fn hand_off(&self, ticket_id: &str) {
        let Some(tracker) = &self.tracker else {
            debug!("No tracker configured, skipping approval hand-off");
            return;
        };
        let status = &self.evaluator.config().approval_status;
        match tracker.update_status(ticket_id, status).await {
            Ok(true) => info!("Moved {} to '{}'", ticket_id, status),
            Ok(false) => warn!("Tracker refused to move {} to '{}'", ticket_id, status),
            Err(e) => warn!("Tracker update for {} failed: {}", ticket_id, e),
        }
    }
}

#[async_trait]
impl Stage for QualityGateStage {
    fn name(&self) -> &str {
        names::GATE
    }

    fn description(&self) -> &str {
        "Runs lint and tests and reports failures for repair"
    }

    async fn execute(&self, state: &PipelineState) -> CoreResult<StateDelta> {
        let evaluation = self.evaluator.evaluate().await;

        if let Some(report) = evaluation.failure() {
            return Ok(StateDelta::status(Status::Failed).set_error(report));
        }

        if let Some(ticket_id) = state.ticket_id.as_deref() {
            self.hand_off(ticket_id).await;
        }

        Ok(StateDelta::status(Status::Approved).clear_error())
    }
}
