//! Error types for the agent stages.

use gantry_core::CoreError;
use gantry_llm::LlmError;
use gantry_tracker::TrackerError;
use thiserror::Error;

use crate::parse::ParseError;

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur inside an agent stage.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Missing input for {agent}: {input}")]
    MissingInput { agent: String, input: String },

    #[error("Could not parse generated output: {0}")]
    Parse(#[from] ParseError),

    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl AgentError {
    pub fn missing_input(agent: impl Into<String>, input: impl Into<String>) -> Self {
        Self::MissingInput {
            agent: agent.into(),
            input: input.into(),
        }
    }

    /// Convert to the error reported at the stage boundary.
    ///
    /// Core errors keep their identity; everything else becomes a stage failure.
    pub fn into_core(self, stage: &str) -> CoreError {
        match self {
            AgentError::Core(e) => e,
            AgentError::MissingInput { input, .. } => CoreError::MissingInput {
                stage: stage.to_string(),
                input,
            },
            other => CoreError::stage(stage, other),
        }
    }
}
