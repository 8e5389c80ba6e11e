//! Gate command implementation.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use gantry_policy::GateEvaluator;
use gantry_runner::{RunnerConfig, ShellRunner};
use tracing::info;

use super::{GateFailed, ProjectArgs};
use crate::settings::Settings;

#[derive(Args)]
pub struct GateArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Override the lint command
    #[arg(long)]
    pub lint_command: Option<String>,

    /// Override the test command
    #[arg(long)]
    pub test_command: Option<String>,
}

pub async fn execute(args: GateArgs) -> Result<()> {
    let project = &args.project.project;
    if !project.is_dir() {
        anyhow::bail!("Project directory not found: {}", project.display());
    }

    let settings = Settings::load(project, args.project.config.as_deref())?;
    let mut config = settings.gate;
    if let Some(cmd) = args.lint_command {
        config = config.with_lint_command(cmd);
    }
    if let Some(cmd) = args.test_command {
        config = config.with_test_command(cmd);
    }
    config.validate()?;

    info!("Running quality gate in {}", project.display());

    let runner = ShellRunner::new(project, RunnerConfig::default().timeout_secs(config.timeout_secs));
    let evaluator = GateEvaluator::new(Arc::new(runner), config);
    let evaluation = evaluator.evaluate().await;

    println!("{}", evaluation.report());
    println!("Total: {}ms", evaluation.total_duration_ms());

    if evaluation.passed() {
        println!("Quality gate PASSED");
        Ok(())
    } else {
        println!("Quality gate FAILED");
        Err(GateFailed.into())
    }
}
