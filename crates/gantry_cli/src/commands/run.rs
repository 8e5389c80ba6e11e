//! Run command implementation.
//!
//! Wires the tracker, generation client, gate and publisher into an
//! orchestrator and processes at most one work item.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use gantry_agents::{ContractStage, ImplementationStage, IntakeStage};
use gantry_core::{
    CoreError, GitPublisher, Orchestrator, PublishStage, RunOutcome, StageRegistry, Status,
    Workspace, RUNS_DIR,
};
use gantry_llm::LlmAdapter;
use gantry_policy::{GateEvaluator, QualityGateStage};
use gantry_runner::{RunnerConfig, ShellRunner};
use gantry_tracker::HttpTracker;
use tracing::{info, warn};

use super::ProjectArgs;
use crate::settings::Settings;

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Tracker base URL (overrides tracker.base_url)
    #[arg(long, env = "GANTRY_TRACKER_URL")]
    pub tracker_url: Option<String>,

    /// Maximum repair passes before giving up
    #[arg(long)]
    pub max_repairs: Option<u32>,

    /// Skip committing and pushing approved work
    #[arg(long)]
    pub no_publish: bool,
}

pub async fn execute(args: RunArgs) -> Result<()> {
    let project = args
        .project
        .project
        .canonicalize()
        .with_context(|| format!("Project directory not found: {}", args.project.project.display()))?;

    let mut settings = Settings::load(&project, args.project.config.as_deref())?;
    if let Some(max) = args.max_repairs {
        settings.pipeline = settings.pipeline.with_max_repairs(max);
    }

    // Credentials are checked before any work is claimed
    let generator = LlmAdapter::from_config(settings.llm.provider.as_deref(), settings.llm.model.clone())?;
    let base_url = args
        .tracker_url
        .or_else(|| settings.tracker.base_url.clone())
        .unwrap_or_default();
    let tracker = HttpTracker::from_env(base_url)?
        .with_ready_status(settings.tracker.ready_status.clone());
    if tracker.base_url().is_empty() {
        anyhow::bail!("Tracker URL not configured. Set tracker.base_url or GANTRY_TRACKER_URL");
    }
    let tracker = Arc::new(tracker);

    info!(
        "Using {:?} model {} on {}",
        generator.provider(),
        generator.model(),
        project.display()
    );
    let generator = Arc::new(generator);
    let workspace = Arc::new(Workspace::new(&project));

    let runner = ShellRunner::new(
        &project,
        RunnerConfig::default().timeout_secs(settings.gate.timeout_secs),
    );
    let evaluator = GateEvaluator::new(Arc::new(runner), settings.gate.clone());

    let mut registry = StageRegistry::new()
        .with_stage(Arc::new(
            IntakeStage::new(tracker.clone())
                .with_in_progress_status(settings.tracker.in_progress_status.clone()),
        ))
        .with_stage(Arc::new(
            ContractStage::new(generator.clone(), workspace.clone())
                .with_config(settings.contract.clone()),
        ))
        .with_stage(Arc::new(
            ImplementationStage::new(generator, workspace)
                .with_config(settings.implementation.clone()),
        ))
        .with_stage(Arc::new(QualityGateStage::new(evaluator).with_tracker(tracker)));

    if settings.publish.enabled && !args.no_publish {
        let publisher = GitPublisher::new(&project)
            .with_branch_prefix(settings.publish.branch_prefix.clone())
            .with_remote(settings.publish.remote.clone());
        registry = registry.with_stage(Arc::new(PublishStage::new(Arc::new(publisher))));
    }

    let orchestrator =
        Orchestrator::new(Arc::new(registry), settings.pipeline).with_log_dir(project.join(RUNS_DIR));

    let log = match orchestrator.run().await {
        Ok(log) => log,
        Err(e) => {
            if let CoreError::IterationCeilingExceeded {
                last_report: Some(report),
                ..
            } = &e
            {
                println!("Final status: {}", Status::Failed);
                println!("Last failure report:\n{}", report);
            }
            return Err(e.into());
        }
    };

    if let Some(state) = &log.final_state {
        println!("Final status: {}", state.status);
    }
    match log.outcome {
        RunOutcome::Idle => println!("No ready work item. Nothing to do."),
        RunOutcome::Approved => {
            let ticket = log
                .final_state
                .as_ref()
                .and_then(|s| s.ticket_id.clone())
                .unwrap_or_default();
            println!(
                "Ticket {} approved after {} repair pass(es) in {} step(s)",
                ticket,
                log.repairs,
                log.steps()
            );
            if let Some(err) = &log.publish_error {
                warn!("Publishing failed: {}", err);
                println!("Work approved but not published: {}", err);
            }
        }
        other => println!("Run finished with outcome {}", other),
    }
    println!("Run log: {}", log.log_path(&project.join(RUNS_DIR)).display());

    Ok(())
}
