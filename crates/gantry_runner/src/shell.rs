//! Shell-based command runner.
//!
//! Commands are interpreted by `sh -c` (configurable) inside the project root.
//! Each invocation is bounded by the configured timeout; on expiry the child is
//! killed and a failed [`CommandOutput`] is returned.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandOutput, CommandRunner};

/// Runs command lines through a shell in the project root.
pub struct ShellRunner {
    working_dir: PathBuf,
    config: RunnerConfig,
}

impl ShellRunner {
    /// Create a runner rooted at the given project directory.
    pub fn new(working_dir: impl AsRef<Path>, config: RunnerConfig) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
            config,
        }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> RunnerResult<CommandOutput> {
        if command.trim().is_empty() {
            return Err(RunnerError::EmptyCommand);
        }
        if !self.working_dir.is_dir() {
            return Err(RunnerError::WorkdirNotFound(
                self.working_dir.display().to_string(),
            ));
        }

        info!("Running: {}", command);
        let started_at = Utc::now();

        let child = Command::new(&self.config.shell)
            .arg("-c")
            .arg(command)
            .current_dir(&self.working_dir)
            .envs(&self.config.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RunnerError::SpawnFailed {
                command: command.to_string(),
                message: e.to_string(),
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let limit = Duration::from_secs(self.config.timeout_secs);
        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    "Command `{}` timed out after {}s",
                    command, self.config.timeout_secs
                );
                return Ok(CommandOutput::timed_out(
                    command,
                    self.config.timeout_secs,
                    started_at,
                ));
            }
        };

        let result = CommandOutput::exited(
            command,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
            started_at,
        );

        debug!(
            "Command `{}` exited with {:?} in {}ms",
            command, result.exit_code, result.duration_ms
        );
        Ok(result)
    }
}
