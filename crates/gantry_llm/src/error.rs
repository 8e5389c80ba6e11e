//! Error types for generation clients.

use thiserror::Error;

/// Result type for generation operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Generation client errors.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM not configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY")]
    LlmNotConfigured,

    #[error("Unknown LLM provider: {0}")]
    UnknownProvider(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Script exhausted after {0} call(s)")]
    ScriptExhausted(usize),
}
