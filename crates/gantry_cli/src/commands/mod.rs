//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

pub mod gate;
pub mod run;

/// Gantry - ticket-to-code pipeline
#[derive(Parser)]
#[command(name = "gantry")]
#[command(version, about = "Gantry - autonomous ticket-to-code pipeline")]
#[command(long_about = r#"
Gantry claims a ready work item from the tracker, generates a shared
contract, implements backend and frontend code against it, and loops
through lint and test repairs until the quality gate approves the work.

COMMANDS:
  run   → Process one ready work item end to end
  gate  → Run the quality gate checks only

ENVIRONMENT:
  OPENAI_API_KEY / ANTHROPIC_API_KEY   Generation credentials
  GANTRY_TRACKER_TOKEN                 Tracker credentials
  GANTRY_LLM_MODEL                     Model override

EXIT CODES:
  0 - Success (approved, or nothing to do)
  1 - Gate failure or iteration ceiling exceeded
  2 - Missing credentials
  3 - Aborted
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process one ready work item through the pipeline
    Run(run::RunArgs),

    /// Run the quality gate checks on a project
    Gate(gate::GateArgs),
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project root directory
    #[arg(short, long, default_value = ".")]
    pub project: PathBuf,

    /// Configuration file (defaults to gantry.yaml in the project)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// The quality gate rejected the project.
#[derive(Debug, Error)]
#[error("Quality gate failed")]
pub struct GateFailed;
