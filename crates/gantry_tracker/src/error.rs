//! Error types for tracker clients.

use thiserror::Error;

/// Result type alias for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Errors that can occur while talking to a tracker.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Tracker not configured: {0}")]
    NotConfigured(String),

    #[error("Tracker request failed: {0}")]
    Request(String),

    #[error("Tracker returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid tracker response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}
