//! Pipeline state threaded through every stage.
//!
//! [`PipelineState`] is an immutable value. Stages read it and return a
//! [`StateDelta`]; the orchestrator merges the delta with
//! [`PipelineState::apply`] to produce the input of the next stage.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Implementation target selecting which output convention applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Backend,
    Frontend,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Backend => "backend",
            Mode::Frontend => "frontend",
        }
    }

    /// The target processed after this one in a fresh pass.
    pub fn next(&self) -> Mode {
        match self {
            Mode::Backend => Mode::Frontend,
            Mode::Frontend => Mode::Backend,
        }
    }

    pub fn all() -> [Mode; 2] {
        [Mode::Backend, Mode::Frontend]
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse summary of the last stage's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Idle,
    Working,
    ContractLocked,
    Done(Mode),
    Failed,
    Approved,
    Error,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Idle => write!(f, "idle"),
            Status::Working => write!(f, "working"),
            Status::ContractLocked => write!(f, "contract_locked"),
            Status::Done(mode) => write!(f, "done:{}", mode),
            Status::Failed => write!(f, "failed"),
            Status::Approved => write!(f, "approved"),
            Status::Error => write!(f, "error"),
        }
    }
}

/// Which gate check produced a failure report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Lint,
    Test,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Lint => "lint",
            FailureKind::Test => "test",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw tool output from a failed gate check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub kind: FailureKind,
    pub output: String,
}

impl FailureReport {
    pub fn lint(output: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Lint,
            output: output.into(),
        }
    }

    pub fn test(output: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Test,
            output: output.into(),
        }
    }
}

impl std::fmt::Display for FailureReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.output)
    }
}

/// The value threaded through every stage of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    /// Rendered work item description; absent when no work was found
    pub task: Option<String>,
    /// External ticket identifier, present once claimed
    pub ticket_id: Option<String>,
    /// Location of the generated interface definition
    pub contract_path: Option<String>,
    /// Implementation target to process next
    pub mode: Mode,
    /// Outcome of the last stage
    pub status: Status,
    /// Pending failure report; present only while a repair is pending
    pub error: Option<FailureReport>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a stage delta into a new state value.
    ///
    /// Fails if the delta would relocate an already locked contract.
    pub fn apply(&self, delta: StateDelta) -> CoreResult<PipelineState> {
        let mut next = self.clone();

        if let Some(requested) = delta.contract_path {
            match &self.contract_path {
                Some(current) if *current != requested => {
                    return Err(CoreError::ContractRelocated {
                        current: current.clone(),
                        requested,
                    });
                }
                _ => next.contract_path = Some(requested),
            }
        }

        if let Some(task) = delta.task {
            next.task = Some(task);
        }
        if let Some(ticket_id) = delta.ticket_id {
            next.ticket_id = Some(ticket_id);
        }
        if let Some(mode) = delta.mode {
            next.mode = mode;
        }
        if let Some(status) = delta.status {
            next.status = status;
        }
        match delta.error {
            ErrorUpdate::Keep => {}
            ErrorUpdate::Set(report) => next.error = Some(report),
            ErrorUpdate::Clear => next.error = None,
        }

        Ok(next)
    }

    /// Copy of this state targeting a different implementation mode.
    pub fn with_mode(&self, mode: Mode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    /// Copy of this state carrying a pending failure report.
    pub fn with_error(&self, report: FailureReport) -> Self {
        Self {
            error: Some(report),
            ..self.clone()
        }
    }

    /// The pending failure report text, if a repair is pending.
    pub fn error_text(&self) -> Option<&str> {
        self.error.as_ref().map(|r| r.output.as_str())
    }
}

/// How a delta changes the pending failure report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ErrorUpdate {
    #[default]
    Keep,
    Set(FailureReport),
    Clear,
}

/// Changes a stage requests on the pipeline state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateDelta {
    pub task: Option<String>,
    pub ticket_id: Option<String>,
    pub contract_path: Option<String>,
    pub mode: Option<Mode>,
    pub status: Option<Status>,
    pub error: ErrorUpdate,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta that only changes the status.
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub fn with_ticket(mut self, ticket_id: impl Into<String>) -> Self {
        self.ticket_id = Some(ticket_id.into());
        self
    }

    pub fn with_contract_path(mut self, path: impl Into<String>) -> Self {
        self.contract_path = Some(path.into());
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn set_error(mut self, report: FailureReport) -> Self {
        self.error = ErrorUpdate::Set(report);
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.error = ErrorUpdate::Clear;
        self
    }
}

/// Shorten long tool or generated output for log lines.
///
/// Cuts on a char boundary and notes how much was dropped.
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}... [{} more chars]", head, total - max_chars)
}
