//! Quality gate configuration.

use gantry_tracker::DEFAULT_APPROVAL_STATUS;
use serde::{Deserialize, Serialize};

use crate::error::{GateError, GateResult};

/// Commands and hand-off status for the quality gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Static-check command, run first
    pub lint_command: String,
    /// Test command, run only after lint passes
    pub test_command: String,
    /// Per-command wall-clock limit
    pub timeout_secs: u64,
    /// Tracker status set when both checks pass
    pub approval_status: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            lint_command: "npm run lint".to_string(),
            test_command: "npm test".to_string(),
            timeout_secs: 300,
            approval_status: DEFAULT_APPROVAL_STATUS.to_string(),
        }
    }
}

impl GateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lint_command(mut self, command: impl Into<String>) -> Self {
        self.lint_command = command.into();
        self
    }

    pub fn with_test_command(mut self, command: impl Into<String>) -> Self {
        self.test_command = command.into();
        self
    }

    pub fn with_approval_status(mut self, status: impl Into<String>) -> Self {
        self.approval_status = status.into();
        self
    }

    /// Reject configurations the gate cannot run.
    pub fn validate(&self) -> GateResult<()> {
        if self.lint_command.trim().is_empty() {
            return Err(GateError::InvalidConfiguration(
                "lint_command is empty".to_string(),
            ));
        }
        if self.test_command.trim().is_empty() {
            return Err(GateError::InvalidConfiguration(
                "test_command is empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(GateError::InvalidConfiguration(
                "timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
