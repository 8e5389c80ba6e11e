//! Error types for the quality gate.

use thiserror::Error;

/// Result type alias for gate operations.
pub type GateResult<T> = Result<T, GateError>;

/// Errors that can occur while configuring or running the gate.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("Invalid gate configuration: {0}")]
    InvalidConfiguration(String),
}
