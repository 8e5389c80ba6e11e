//! Error types for the runner module.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur during runner operations.
///
/// Non-zero exits and timeouts are not errors; they come back as a failed
/// [`CommandOutput`](crate::CommandOutput).
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Empty command")]
    EmptyCommand,

    #[error("Failed to spawn `{command}`: {message}")]
    SpawnFailed { command: String, message: String },

    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Working directory not found: {0}")]
    WorkdirNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
