//! Persistent audit trail of a pipeline run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::state::{Mode, PipelineState, Status};

/// Directory, relative to the project root, where run logs are kept.
pub const RUNS_DIR: &str = ".gantry/runs";

/// How a run ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    #[default]
    Running,
    /// No ready work item was found
    Idle,
    /// The gate approved the work
    Approved,
    /// The run stopped on an error or the iteration ceiling
    Aborted,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunOutcome::Running => "running",
            RunOutcome::Idle => "idle",
            RunOutcome::Approved => "approved",
            RunOutcome::Aborted => "aborted",
        };
        write!(f, "{}", s)
    }
}

/// One stage invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// 1-based invocation number
    pub step: u32,
    pub stage: String,
    pub mode: Mode,
    pub from: Status,
    pub to: Status,
    pub at: DateTime<Utc>,
    pub note: Option<String>,
}

/// Persistent run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub outcome: RunOutcome,
    pub transitions: Vec<TransitionRecord>,
    /// Repair passes taken so far
    pub repairs: u32,
    pub final_state: Option<PipelineState>,
    /// Error message if the run aborted
    pub error: Option<String>,
    /// Error message if publishing failed after approval
    pub publish_error: Option<String>,
}

impl RunLog {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            completed_at: None,
            outcome: RunOutcome::Running,
            transitions: Vec::new(),
            repairs: 0,
            final_state: None,
            error: None,
            publish_error: None,
        }
    }

    /// Number of stage invocations recorded.
    pub fn steps(&self) -> u32 {
        self.transitions.len() as u32
    }

    /// Append a transition and return its step number.
    pub fn record(
        &mut self,
        stage: &str,
        mode: Mode,
        from: Status,
        to: Status,
        note: Option<String>,
    ) -> u32 {
        let step = self.steps() + 1;
        self.transitions.push(TransitionRecord {
            step,
            stage: stage.to_string(),
            mode,
            from,
            to,
            at: Utc::now(),
            note,
        });
        step
    }

    /// Mark the run as finished.
    pub fn finish(&mut self, outcome: RunOutcome, state: Option<PipelineState>) {
        self.outcome = outcome;
        if state.is_some() {
            self.final_state = state;
        }
        self.completed_at = Some(Utc::now());
    }

    /// Number of invocations of a named stage.
    pub fn invocations(&self, stage: &str) -> usize {
        self.transitions.iter().filter(|t| t.stage == stage).count()
    }

    /// Log file path under a runs directory.
    pub fn log_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.json", self.run_id))
    }

    /// Save the log as pretty JSON into `dir`.
    pub fn save(&self, dir: &Path) -> CoreResult<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = self.log_path(dir);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        fs::write(&path, json)?;
        debug!("Saved run log to {:?}", path);
        Ok(path)
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}
