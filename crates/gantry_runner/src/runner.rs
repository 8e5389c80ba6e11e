//! Command runner trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RunnerResult;

/// Result of a command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    /// The command line that was executed
    pub command: String,
    /// Whether the command exited with status 0 before the timeout
    pub success: bool,
    /// Exit code, if the process exited on its own
    pub exit_code: Option<i32>,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Whether the process was killed because it ran past the timeout
    pub timed_out: bool,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Execution end time
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl CommandOutput {
    /// Build an output for a process that exited on its own.
    pub fn exited(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let finished_at = Utc::now();
        Self {
            command: command.into(),
            success: exit_code == Some(0),
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out: false,
            started_at,
            finished_at,
            duration_ms: elapsed_ms(started_at, finished_at),
        }
    }

    /// Build an output for a process killed at the timeout.
    pub fn timed_out(command: impl Into<String>, timeout_secs: u64, started_at: DateTime<Utc>) -> Self {
        let command = command.into();
        let finished_at = Utc::now();
        Self {
            stderr: format!("Command `{}` timed out after {} seconds", command, timeout_secs),
            command,
            success: false,
            exit_code: None,
            stdout: String::new(),
            timed_out: true,
            started_at,
            finished_at,
            duration_ms: elapsed_ms(started_at, finished_at),
        }
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

fn elapsed_ms(started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> u64 {
    (finished_at - started_at).num_milliseconds().max(0) as u64
}

/// Executes shell command lines on behalf of the quality gate.
///
/// Implementations run with the project root as working directory and must
/// return within their configured timeout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command line and capture its outcome.
    async fn run(&self, command: &str) -> RunnerResult<CommandOutput>;
}
