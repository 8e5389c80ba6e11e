//! Error types for the core module.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Stage not found: {0}")]
    StageNotFound(String),

    #[error("Invalid pipeline state: {0}")]
    InvalidState(String),

    #[error("Stage '{stage}' requires {input}")]
    MissingInput { stage: String, input: String },

    #[error("Stage execution failed: {stage} - {message}")]
    StageFailed { stage: String, message: String },

    #[error("Stage '{stage}' reported an error status")]
    StageErrored { stage: String },

    #[error("Contract path is immutable: already '{current}', refusing '{requested}'")]
    ContractRelocated { current: String, requested: String },

    #[error(
        "Iteration ceiling exceeded after {repairs} repair pass(es) and {steps} stage invocation(s)"
    )]
    IterationCeilingExceeded {
        repairs: u32,
        steps: u32,
        /// Raw text of the last failure report, if any
        last_report: Option<String>,
    },

    #[error("Path rejected: '{0}' escapes the project root")]
    PathRejected(String),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Git error: {0}")]
    GitError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CoreError {
    /// Wrap any displayable error as a stage failure.
    pub fn stage(stage: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::StageFailed {
            stage: stage.into(),
            message: err.to_string(),
        }
    }
}
