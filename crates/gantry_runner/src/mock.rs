//! Mock command runner for testing.
//!
//! Provides a configurable mock implementation of the CommandRunner trait
//! for use in unit tests without spawning real processes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandOutput, CommandRunner};

/// Predefined mock response for a command execution.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
            timed_out: false,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
            timed_out: false,
        }
    }

    pub fn timeout() -> Self {
        Self {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: true,
        }
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub command: String,
}

/// Mock command runner for testing.
///
/// Responses are returned in order and cycle once exhausted, so a single
/// failure response models a tool that never passes.
#[derive(Clone)]
pub struct MockRunner {
    /// Predefined responses for run calls.
    responses: Arc<RwLock<Vec<MockResponse>>>,
    /// Index of next response to return.
    response_index: Arc<AtomicUsize>,
    /// Captured calls for verification.
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Simulated spawn failure.
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    /// Create a new mock runner. With no responses every command succeeds.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Add a mock response for the next run call.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Set multiple responses.
    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    /// Make every run fail to spawn.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Get the executed command lines, in order.
    pub fn commands(&self) -> Vec<String> {
        self.captured_calls
            .read()
            .iter()
            .map(|c| c.command.clone())
            .collect()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a specific command was run.
    pub fn was_called(&self, command: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.command == command)
    }

    fn next_response(&self) -> MockResponse {
        let responses = self.responses.read();
        if responses.is_empty() {
            return MockResponse::success("");
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index % responses.len())
            .cloned()
            .unwrap_or_else(|| MockResponse::success(""))
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, command: &str) -> RunnerResult<CommandOutput> {
        self.captured_calls.write().push(CapturedCall {
            command: command.to_string(),
        });

        if let Some(message) = self.simulate_failure.read().clone() {
            return Err(RunnerError::SpawnFailed {
                command: command.to_string(),
                message,
            });
        }

        let response = self.next_response();
        let started_at = Utc::now();
        if response.timed_out {
            return Ok(CommandOutput::timed_out(command, 0, started_at));
        }

        Ok(CommandOutput::exited(
            command,
            response.exit_code,
            response.stdout,
            response.stderr,
            started_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_runner_defaults_to_success() {
        let runner = MockRunner::new();

        let output = runner.run("npm run lint").await.unwrap();

        assert!(output.success);
        assert!(runner.was_called("npm run lint"));
    }

    #[tokio::test]
    async fn test_mock_runner_multiple_responses() {
        let runner = MockRunner::new().with_responses(vec![
            MockResponse::failure(1, "unused import"),
            MockResponse::success("clean"),
        ]);

        let r1 = runner.run("lint").await.unwrap();
        assert!(!r1.success);
        assert_eq!(r1.stderr, "unused import");

        let r2 = runner.run("lint").await.unwrap();
        assert!(r2.success);

        // Responses cycle
        let r3 = runner.run("lint").await.unwrap();
        assert!(!r3.success);

        assert_eq!(runner.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_runner_timeout_response() {
        let runner = MockRunner::new().add_response(MockResponse::timeout());

        let output = runner.run("npm test").await.unwrap();

        assert!(output.timed_out);
        assert!(!output.success);
    }

    #[tokio::test]
    async fn test_mock_runner_failure_simulation() {
        let runner = MockRunner::new().simulate_failure("no shell");

        let result = runner.run("lint").await;

        assert!(result.is_err());
        assert_eq!(runner.commands(), vec!["lint".to_string()]);
    }
}
