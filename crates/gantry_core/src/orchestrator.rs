//! Pipeline orchestrator.
//!
//! Drives the registered stages through the fixed transition graph:
//!
//! ```text
//! intake -> idle (end)
//!        -> contract -> implement(backend) -> implement(frontend) -> gate
//! gate   -> approved -> publish (end)
//!        -> failed   -> repair pass -> gate
//! ```
//!
//! Every invocation is recorded in a [`RunLog`]. The number of repair passes
//! is bounded by [`PipelineConfig::max_repairs`] and the total number of
//! invocations by [`PipelineConfig::step_budget`]; exceeding either aborts
//! the run with [`CoreError::IterationCeilingExceeded`].

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::error::{CoreError, CoreResult};
use crate::registry::StageRegistry;
use crate::run_log::{RunLog, RunOutcome};
use crate::stage::names;
use crate::state::{FailureReport, Mode, PipelineState, Status};

/// Runs one ticket through the pipeline to completion or exhaustion.
pub struct Orchestrator {
    registry: Arc<StageRegistry>,
    config: PipelineConfig,
    log_dir: Option<PathBuf>,
}

impl Orchestrator {
    pub fn new(registry: Arc<StageRegistry>, config: PipelineConfig) -> Self {
        Self {
            registry,
            config,
            log_dir: None,
        }
    }

    /// Persist the run log into this directory after every step.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline from an empty state.
    pub async fn run(&self) -> CoreResult<RunLog> {
        self.run_from(PipelineState::new()).await
    }

    /// Run the pipeline from a given initial state.
    ///
    /// Returns the finished log for idle and approved runs. An aborted run
    /// has its log saved with outcome `aborted` and returns the error.
    pub async fn run_from(&self, initial: PipelineState) -> CoreResult<RunLog> {
        self.registry.validate()?;

        let mut log = RunLog::new();
        info!("Starting pipeline run {}", log.run_id);

        match self.drive(&mut log, initial).await {
            Ok(()) => {
                self.persist(&log)?;
                info!("Run {} finished: {}", log.run_id, log.outcome);
                Ok(log)
            }
            Err(e) => {
                error!("Run {} aborted: {}", log.run_id, e);
                log.error = Some(e.to_string());
                log.finish(RunOutcome::Aborted, None);
                if let Err(save_err) = self.persist(&log) {
                    warn!("Could not save run log: {}", save_err);
                }
                Err(e)
            }
        }
    }

    async fn drive(&self, log: &mut RunLog, initial: PipelineState) -> CoreResult<()> {
        let state = self.invoke(log, names::INTAKE, &initial, None).await?;
        if state.task.is_none() || state.status == Status::Idle {
            info!("No ready work item, run is idle");
            log.finish(RunOutcome::Idle, Some(state));
            return Ok(());
        }

        let state = self.invoke(log, names::CONTRACT, &state, None).await?;

        let mut state = self
            .implement_pass(log, state, &Mode::all(), None, "fresh".to_string())
            .await?;

        loop {
            state = self.invoke(log, names::GATE, &state, None).await?;

            match state.status {
                Status::Approved => {
                    let state = self.publish(log, state).await?;
                    log.finish(RunOutcome::Approved, Some(state));
                    return Ok(());
                }
                Status::Failed => {
                    let report = state.error.clone().ok_or_else(|| {
                        CoreError::InvalidState("gate failed without a report".to_string())
                    })?;

                    let targets = self.config.repair_routing.targets(report.kind);
                    if let Some(first) = targets.first() {
                        state = state.with_mode(*first);
                        log.final_state = Some(state.clone());
                    }

                    if log.repairs >= self.config.max_repairs {
                        warn!(
                            "Repair ceiling of {} reached, giving up",
                            self.config.max_repairs
                        );
                        log.final_state = Some(state);
                        return Err(CoreError::IterationCeilingExceeded {
                            repairs: log.repairs,
                            steps: log.steps(),
                            last_report: Some(report.output),
                        });
                    }

                    log.repairs += 1;
                    info!(
                        "Repair pass {}/{} for {} failure, targets: {:?}",
                        log.repairs, self.config.max_repairs, report.kind, targets
                    );

                    let note = format!("repair {} ({})", log.repairs, report.kind);
                    state = self
                        .implement_pass(log, state, &targets, Some(&report), note)
                        .await?;
                }
                other => {
                    return Err(CoreError::InvalidState(format!(
                        "gate returned unexpected status '{}'",
                        other
                    )));
                }
            }
        }
    }

    /// Visit each target once in order.
    ///
    /// After every visit `mode` names the next target of the pass; after the
    /// last one it names the pass's first target again. A report, when given,
    /// is attached to every visit.
    async fn implement_pass(
        &self,
        log: &mut RunLog,
        mut state: PipelineState,
        targets: &[Mode],
        report: Option<&FailureReport>,
        note: String,
    ) -> CoreResult<PipelineState> {
        for (i, mode) in targets.iter().enumerate() {
            let input = match report {
                Some(report) => state.with_mode(*mode).with_error(report.clone()),
                None => state.with_mode(*mode),
            };
            state = self
                .invoke(log, names::IMPLEMENT, &input, Some(note.clone()))
                .await?;

            if let Some(upcoming) = targets.get(i + 1).or_else(|| targets.first()) {
                state = state.with_mode(*upcoming);
                log.final_state = Some(state.clone());
            }
        }
        Ok(state)
    }

    /// Run the publish stage once, if registered. Failures are recorded only.
    async fn publish(&self, log: &mut RunLog, state: PipelineState) -> CoreResult<PipelineState> {
        if !self.registry.contains(names::PUBLISH) {
            debug!("No publish stage registered");
            return Ok(state);
        }

        match self.invoke(log, names::PUBLISH, &state, None).await {
            Ok(next) => Ok(next),
            Err(e @ CoreError::IterationCeilingExceeded { .. }) => Err(e),
            Err(e) => {
                warn!("Publish failed after approval: {}", e);
                log.publish_error = Some(e.to_string());
                Ok(state)
            }
        }
    }

    /// Invoke one stage, merge its delta and record the transition.
    async fn invoke(
        &self,
        log: &mut RunLog,
        name: &str,
        state: &PipelineState,
        note: Option<String>,
    ) -> CoreResult<PipelineState> {
        let budget = self.config.step_budget();
        if log.steps() >= budget {
            warn!("Step budget of {} exhausted before '{}'", budget, name);
            return Err(CoreError::IterationCeilingExceeded {
                repairs: log.repairs,
                steps: log.steps(),
                last_report: state.error_text().map(str::to_string),
            });
        }

        let stage = self.registry.get_required(name)?;
        info!(
            "Executing stage [{}]: {} (mode={})",
            log.steps() + 1,
            name,
            state.mode
        );

        let outcome = match stage.execute(state).await {
            Ok(delta) => state.apply(delta),
            Err(e) => Err(e),
        };

        let next = match outcome {
            Ok(next) => next,
            Err(e) => {
                log.record(
                    name,
                    state.mode,
                    state.status,
                    state.status,
                    Some(format!("failed: {}", e)),
                );
                self.persist(log)?;
                return Err(match e {
                    e @ CoreError::StageFailed { .. } => e,
                    e @ CoreError::ContractRelocated { .. } => e,
                    e @ CoreError::PathRejected(_) => e,
                    other => CoreError::stage(name, other),
                });
            }
        };

        log.record(name, state.mode, state.status, next.status, note);
        log.final_state = Some(next.clone());
        self.persist(log)?;
        debug!("Stage '{}': {} -> {}", name, state.status, next.status);

        if next.status == Status::Error {
            return Err(CoreError::StageErrored {
                stage: name.to_string(),
            });
        }

        Ok(next)
    }

    fn persist(&self, log: &RunLog) -> CoreResult<()> {
        if let Some(dir) = &self.log_dir {
            log.save(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RepairRouting, RepairTarget};
    use crate::stage::Stage;
    use crate::state::{FailureReport, StateDelta};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    struct FakeIntake {
        task: Option<&'static str>,
    }

    #[async_trait]
    impl Stage for FakeIntake {
        fn name(&self) -> &str {
            names::INTAKE
        }
        fn description(&self) -> &str {
            "fake intake"
        }
        async fn execute(&self, _state: &PipelineState) -> CoreResult<StateDelta> {
            Ok(match self.task {
                Some(task) => StateDelta::status(Status::Working)
                    .with_task(task)
                    .with_ticket("T-1"),
                None => StateDelta::status(Status::Idle),
            })
        }
    }

    struct FakeContract {
        status: Status,
    }

    #[async_trait]
    impl Stage for FakeContract {
        fn name(&self) -> &str {
            names::CONTRACT
        }
        fn description(&self) -> &str {
            "fake contract"
        }
        async fn execute(&self, _state: &PipelineState) -> CoreResult<StateDelta> {
            Ok(StateDelta::status(self.status).with_contract_path("types/x.ts"))
        }
    }

    /// Records (mode, pending error) per call.
    #[derive(Default)]
    struct FakeImplement {
        calls: Mutex<Vec<(Mode, Option<String>)>>,
    }

    #[async_trait]
    impl Stage for FakeImplement {
        fn name(&self) -> &str {
            names::IMPLEMENT
        }
        fn description(&self) -> &str {
            "fake implement"
        }
        async fn execute(&self, state: &PipelineState) -> CoreResult<StateDelta> {
            self.calls
                .lock()
                .push((state.mode, state.error_text().map(str::to_string)));
            Ok(StateDelta::status(Status::Done(state.mode))
                .clear_error()
                .with_mode(state.mode.next()))
        }
    }

    /// Pops scripted reports; an empty script approves. `always_fail` never approves.
    struct FakeGate {
        script: Mutex<VecDeque<FailureReport>>,
        always_fail: bool,
    }

    impl FakeGate {
        fn approving_after(reports: Vec<FailureReport>) -> Self {
            Self {
                script: Mutex::new(reports.into()),
                always_fail: false,
            }
        }

        fn always_failing() -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                always_fail: true,
            }
        }
    }

    #[async_trait]
    impl Stage for FakeGate {
        fn name(&self) -> &str {
            names::GATE
        }
        fn description(&self) -> &str {
            "fake gate"
        }
        async fn execute(&self, _state: &PipelineState) -> CoreResult<StateDelta> {
            if self.always_fail {
                return Ok(StateDelta::status(Status::Failed)
                    .set_error(FailureReport::test("1 test failed")));
            }
            match self.script.lock().pop_front() {
                Some(report) => Ok(StateDelta::status(Status::Failed).set_error(report)),
                None => Ok(StateDelta::status(Status::Approved).clear_error()),
            }
        }
    }

    struct FakePublish {
        fail: bool,
    }

    #[async_trait]
    impl Stage for FakePublish {
        fn name(&self) -> &str {
            names::PUBLISH
        }
        fn description(&self) -> &str {
            "fake publish"
        }
        async fn execute(&self, _state: &PipelineState) -> CoreResult<StateDelta> {
            if self.fail {
                Err(CoreError::PublishFailed("remote rejected".to_string()))
            } else {
                Ok(StateDelta::new())
            }
        }
    }

    fn registry(
        intake: FakeIntake,
        contract_status: Status,
        implement: Arc<FakeImplement>,
        gate: FakeGate,
    ) -> StageRegistry {
        StageRegistry::new()
            .with_stage(Arc::new(intake))
            .with_stage(Arc::new(FakeContract {
                status: contract_status,
            }))
            .with_stage(implement)
            .with_stage(Arc::new(gate))
    }

    #[tokio::test]
    async fn test_idle_run_invokes_only_intake() {
        let implement = Arc::new(FakeImplement::default());
        let registry = registry(
            FakeIntake { task: None },
            Status::ContractLocked,
            implement.clone(),
            FakeGate::approving_after(vec![]),
        );
        let orchestrator = Orchestrator::new(Arc::new(registry), PipelineConfig::default());

        let log = orchestrator.run().await.unwrap();

        assert_eq!(log.outcome, RunOutcome::Idle);
        assert_eq!(log.steps(), 1);
        assert!(implement.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_fresh_pass_then_approval() {
        let implement = Arc::new(FakeImplement::default());
        let registry = registry(
            FakeIntake {
                task: Some("Add X endpoint"),
            },
            Status::ContractLocked,
            implement.clone(),
            FakeGate::approving_after(vec![]),
        )
        .with_stage(Arc::new(FakePublish { fail: false }));
        let orchestrator = Orchestrator::new(Arc::new(registry), PipelineConfig::default());

        let log = orchestrator.run().await.unwrap();

        assert_eq!(log.outcome, RunOutcome::Approved);
        let stages: Vec<&str> = log.transitions.iter().map(|t| t.stage.as_str()).collect();
        assert_eq!(
            stages,
            vec!["intake", "contract", "implement", "implement", "gate", "publish"]
        );
        assert_eq!(
            *implement.calls.lock(),
            vec![(Mode::Backend, None), (Mode::Frontend, None)]
        );
        let final_state = log.final_state.unwrap();
        assert_eq!(final_state.status, Status::Approved);
        assert_eq!(final_state.contract_path.as_deref(), Some("types/x.ts"));
    }

    #[tokio::test]
    async fn test_repair_pass_gets_report_and_clears_it() {
        let implement = Arc::new(FakeImplement::default());
        let registry = registry(
            FakeIntake {
                task: Some("Add X endpoint"),
            },
            Status::ContractLocked,
            implement.clone(),
            FakeGate::approving_after(vec![FailureReport::lint("unused import")]),
        );
        let orchestrator = Orchestrator::new(Arc::new(registry), PipelineConfig::default());

        let log = orchestrator.run().await.unwrap();

        assert_eq!(log.outcome, RunOutcome::Approved);
        assert_eq!(log.repairs, 1);
        let calls = implement.calls.lock();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[2],
            (Mode::Backend, Some("unused import".to_string()))
        );
        assert!(log.final_state.unwrap().error.is_none());
    }

    #[tokio::test]
    async fn test_repair_routing_both_keeps_report_for_each_target() {
        let implement = Arc::new(FakeImplement::default());
        let registry = registry(
            FakeIntake { task: Some("task") },
            Status::ContractLocked,
            implement.clone(),
            FakeGate::approving_after(vec![FailureReport::test("assertion failed")]),
        );
        let config = PipelineConfig::default().with_repair_routing(RepairRouting {
            lint: RepairTarget::Backend,
            test: RepairTarget::Both,
        });
        let orchestrator = Orchestrator::new(Arc::new(registry), config);

        orchestrator.run().await.unwrap();

        let calls = implement.calls.lock();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[2], (Mode::Backend, Some("assertion failed".to_string())));
        assert_eq!(calls[3], (Mode::Frontend, Some("assertion failed".to_string())));
    }

    #[tokio::test]
    async fn test_ceiling_aborts_after_max_repairs() {
        let dir = TempDir::new().unwrap();
        let implement = Arc::new(FakeImplement::default());
        let registry = registry(
            FakeIntake { task: Some("task") },
            Status::ContractLocked,
            implement.clone(),
            FakeGate::always_failing(),
        );
        let orchestrator = Orchestrator::new(
            Arc::new(registry),
            PipelineConfig::default().with_max_repairs(3),
        )
        .with_log_dir(dir.path());

        let err = orchestrator.run().await.unwrap_err();

        match err {
            CoreError::IterationCeilingExceeded {
                repairs,
                last_report,
                ..
            } => {
                assert_eq!(repairs, 3);
                assert_eq!(last_report.as_deref(), Some("1 test failed"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // 2 fresh visits + 3 repair visits
        assert_eq!(implement.calls.lock().len(), 5);

        let saved = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
        let log = RunLog::load(&saved.path()).unwrap();
        assert_eq!(log.outcome, RunOutcome::Aborted);
        assert_eq!(log.repairs, 3);
        assert_eq!(log.invocations(names::GATE), 4);
    }

    fn saved_log(dir: &TempDir) -> RunLog {
        let saved = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
        RunLog::load(&saved.path()).unwrap()
    }

    #[tokio::test]
    async fn test_mode_names_next_repair_target_after_failed_gate() {
        let dir = TempDir::new().unwrap();
        let registry = registry(
            FakeIntake { task: Some("task") },
            Status::ContractLocked,
            Arc::new(FakeImplement::default()),
            FakeGate::always_failing(),
        );
        let orchestrator = Orchestrator::new(
            Arc::new(registry),
            PipelineConfig::default().with_max_repairs(2),
        )
        .with_log_dir(dir.path());

        orchestrator.run().await.unwrap_err();

        let log = saved_log(&dir);
        let state = log.final_state.clone().unwrap();
        assert_eq!(state.status, Status::Failed);
        assert_eq!(state.mode, Mode::Backend);
        assert!(log
            .transitions
            .iter()
            .filter(|t| t.stage == names::GATE)
            .all(|t| t.mode == Mode::Backend));
    }

    #[tokio::test]
    async fn test_mode_follows_frontend_routing() {
        let dir = TempDir::new().unwrap();
        let implement = Arc::new(FakeImplement::default());
        let registry = registry(
            FakeIntake { task: Some("task") },
            Status::ContractLocked,
            implement.clone(),
            FakeGate::always_failing(),
        );
        let config = PipelineConfig::default()
            .with_max_repairs(1)
            .with_repair_routing(RepairRouting::uniform(RepairTarget::Frontend));
        let orchestrator = Orchestrator::new(Arc::new(registry), config).with_log_dir(dir.path());

        orchestrator.run().await.unwrap_err();

        let modes: Vec<Mode> = implement.calls.lock().iter().map(|(m, _)| *m).collect();
        assert_eq!(modes, vec![Mode::Backend, Mode::Frontend, Mode::Frontend]);

        let log = saved_log(&dir);
        let gates: Vec<Mode> = log
            .transitions
            .iter()
            .filter(|t| t.stage == names::GATE)
            .map(|t| t.mode)
            .collect();
        // Fresh pass ends on its first target; a frontend-only pass stays on frontend
        assert_eq!(gates, vec![Mode::Backend, Mode::Frontend]);
        assert_eq!(log.final_state.unwrap().mode, Mode::Frontend);
    }

    #[tokio::test]
    async fn test_step_budget_aborts() {
        let implement = Arc::new(FakeImplement::default());
        let registry = registry(
            FakeIntake { task: Some("task") },
            Status::ContractLocked,
            implement,
            FakeGate::always_failing(),
        );
        let config = PipelineConfig::default()
            .with_max_repairs(10)
            .with_max_steps(6);
        let orchestrator = Orchestrator::new(Arc::new(registry), config);

        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::IterationCeilingExceeded { steps: 6, .. }
        ));
    }

    #[tokio::test]
    async fn test_contract_error_status_aborts() {
        let implement = Arc::new(FakeImplement::default());
        let registry = registry(
            FakeIntake { task: Some("task") },
            Status::Error,
            implement.clone(),
            FakeGate::approving_after(vec![]),
        );
        let orchestrator = Orchestrator::new(Arc::new(registry), PipelineConfig::default());

        let err = orchestrator.run().await.unwrap_err();

        assert!(matches!(err, CoreError::StageErrored { stage } if stage == "contract"));
        assert!(implement.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_still_approved() {
        let registry = registry(
            FakeIntake { task: Some("task") },
            Status::ContractLocked,
            Arc::new(FakeImplement::default()),
            FakeGate::approving_after(vec![]),
        )
        .with_stage(Arc::new(FakePublish { fail: true }));
        let orchestrator = Orchestrator::new(Arc::new(registry), PipelineConfig::default());

        let log = orchestrator.run().await.unwrap();

        assert_eq!(log.outcome, RunOutcome::Approved);
        assert!(log
            .publish_error
            .as_deref()
            .unwrap()
            .contains("remote rejected"));
        assert_eq!(log.invocations(names::PUBLISH), 1);
    }

    #[tokio::test]
    async fn test_missing_stage_rejected_up_front() {
        let registry = StageRegistry::new().with_stage(Arc::new(FakeIntake { task: None }));
        let orchestrator = Orchestrator::new(Arc::new(registry), PipelineConfig::default());

        assert!(matches!(
            orchestrator.run().await,
            Err(CoreError::StageNotFound(_))
        ));
    }
}
