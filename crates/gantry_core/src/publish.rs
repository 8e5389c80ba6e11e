//! Terminal success action: hand approved work to version control.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::run_log::RUNS_DIR;
use crate::stage::{names, Stage};
use crate::state::{PipelineState, StateDelta};

/// What gets published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub ticket_id: String,
    /// Commit message subject
    pub title: String,
}

impl PublishRequest {
    /// Build a request from the pipeline state.
    ///
    /// The title is the first non-empty line of the task.
    pub fn from_state(state: &PipelineState) -> CoreResult<Self> {
        let ticket_id = state.ticket_id.clone().ok_or_else(|| CoreError::MissingInput {
            stage: names::PUBLISH.to_string(),
            input: "ticket_id".to_string(),
        })?;
        let title = state
            .task
            .as_deref()
            .and_then(|t| t.lines().map(str::trim).find(|l| !l.is_empty()))
            .unwrap_or("Automated change")
            .to_string();
        Ok(Self { ticket_id, title })
    }
}

/// Result of a publish action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishReceipt {
    pub branch: Option<String>,
    pub commit: Option<String>,
    pub pushed: bool,
}

/// Publishes approved work.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, request: &PublishRequest) -> CoreResult<PublishReceipt>;
}

/// Publisher that does nothing.
#[derive(Debug, Default, Clone)]
pub struct NoopPublisher;

#[async_trait]
impl Publisher for NoopPublisher {
    async fn publish(&self, request: &PublishRequest) -> CoreResult<PublishReceipt> {
        info!("Publishing disabled, leaving {} uncommitted", request.ticket_id);
        Ok(PublishReceipt {
            branch: None,
            commit: None,
            pushed: false,
        })
    }
}

/// Publishes through the git CLI: branch, stage everything, commit, push.
#[derive(Debug, Clone)]
pub struct GitPublisher {
    repo_path: PathBuf,
    branch_prefix: String,
    /// Remote to push to; `None` commits locally only
    remote: Option<String>,
}

impl GitPublisher {
    pub fn new(repo_path: impl AsRef<Path>) -> Self {
        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
            branch_prefix: "gantry".to_string(),
            remote: Some("origin".to_string()),
        }
    }

    pub fn with_branch_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.branch_prefix = prefix.into();
        self
    }

    pub fn with_remote(mut self, remote: Option<String>) -> Self {
        self.remote = remote;
        self
    }

    /// Branch name for a ticket.
    pub fn branch_for(&self, ticket_id: &str) -> String {
        let slug: String = ticket_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
            .collect();
        format!("{}/{}", self.branch_prefix.trim_end_matches('/'), slug)
    }

    async fn git(&self, args: &[&str]) -> CoreResult<String> {
        debug!("git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .await
            .map_err(|e| CoreError::GitError(format!("Failed to run git {}: {}", args[0], e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            if stdout.contains("nothing to commit") || stderr.contains("nothing to commit") {
                return Err(CoreError::GitError("Nothing to commit".to_string()));
            }
            return Err(CoreError::GitError(format!(
                "git {} failed: {}",
                args[0],
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl Publisher for GitPublisher {
    async fn publish(&self, request: &PublishRequest) -> CoreResult<PublishReceipt> {
        if !self.repo_path.join(".git").exists() {
            return Err(CoreError::GitError("Repository not initialized".to_string()));
        }

        let branch = self.branch_for(&request.ticket_id);
        info!("Publishing {} on branch {}", request.ticket_id, branch);

        // -B resets an existing branch left over from an earlier attempt.
        self.git(&["checkout", "-B", &branch]).await?;
        // Run logs stay local; only project changes are committed.
        let exclude_runs = format!(":(exclude){}", RUNS_DIR);
        self.git(&["add", "-A", "--", ".", &exclude_runs]).await?;
        let message = format!("{} ({})", request.title, request.ticket_id);
        self.git(&["commit", "-m", &message]).await?;
        let commit = self.git(&["rev-parse", "HEAD"]).await?;

        let pushed = match &self.remote {
            Some(remote) => {
                info!("Pushing to {} {}", remote, branch);
                self.git(&["push", "--set-upstream", remote, &branch]).await?;
                true
            }
            None => false,
        };

        Ok(PublishReceipt {
            branch: Some(branch),
            commit: Some(commit),
            pushed,
        })
    }
}

/// Stage wrapper running a [`Publisher`] once the gate approves.
pub struct PublishStage {
    publisher: Arc<dyn Publisher>,
}

impl PublishStage {
    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl Stage for PublishStage {
    fn name(&self) -> &str {
        names::PUBLISH
    }

    fn description(&self) -> &str {
        "Commits and pushes approved work"
    }

    async fn execute(&self, state: &PipelineState) -> CoreResult<StateDelta> {
        let request = PublishRequest::from_state(state)?;
        let receipt = self
            .publisher
            .publish(&request)
            .await
            .map_err(|e| CoreError::PublishFailed(e.to_string()))?;
        info!(
            "Published {}: branch={:?} commit={:?} pushed={}",
            request.ticket_id, receipt.branch, receipt.commit, receipt.pushed
        );
        Ok(StateDelta::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Status;
    use tempfile::TempDir;

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn approved_state() -> PipelineState {
        PipelineState::new()
            .apply(
                StateDelta::status(Status::Approved)
                    .with_task("Add X endpoint\n\nExpose X over HTTP")
                    .with_ticket("T-42"),
            )
            .unwrap()
    }

    #[test]
    fn test_request_from_state() {
        let request = PublishRequest::from_state(&approved_state()).unwrap();
        assert_eq!(request.ticket_id, "T-42");
        assert_eq!(request.title, "Add X endpoint");

        assert!(matches!(
            PublishRequest::from_state(&PipelineState::new()),
            Err(CoreError::MissingInput { .. })
        ));
    }

    #[test]
    fn test_branch_name_is_sanitized() {
        let publisher = GitPublisher::new(".").with_branch_prefix("auto/");
        assert_eq!(publisher.branch_for("PROJ 12"), "auto/PROJ-12");
    }

    #[tokio::test]
    async fn test_noop_stage_leaves_state() {
        let stage = PublishStage::new(Arc::new(NoopPublisher));
        let delta = stage.execute(&approved_state()).await.unwrap();
        assert_eq!(delta, StateDelta::new());
    }

    #[tokio::test]
    async fn test_git_publish_commits_on_branch() {
        if !git_available() {
            println!("Git not available, skipping test");
            return;
        }

        let dir = TempDir::new().unwrap();
        let run = |args: &[&str]| {
            std::process::Command::new("git")
                .args(args)
                .current_dir(dir.path())
                .output()
                .unwrap()
        };
        run(&["init"]);
        run(&["config", "user.email", "ci@example.com"]);
        run(&["config", "user.name", "CI"]);
        std::fs::write(dir.path().join("x.ts"), "export {}").unwrap();
        std::fs::create_dir_all(dir.path().join(RUNS_DIR)).unwrap();
        std::fs::write(dir.path().join(RUNS_DIR).join("run.json"), "{}").unwrap();

        let publisher = GitPublisher::new(dir.path()).with_remote(None);
        let receipt = publisher
            .publish(&PublishRequest {
                ticket_id: "T-42".to_string(),
                title: "Add X endpoint".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(receipt.branch.as_deref(), Some("gantry/T-42"));
        assert!(receipt.commit.is_some());
        assert!(!receipt.pushed);

        let log = run(&["log", "-1", "--format=%s"]);
        assert_eq!(
            String::from_utf8_lossy(&log.stdout).trim(),
            "Add X endpoint (T-42)"
        );

        let files = run(&["ls-files"]);
        let files = String::from_utf8_lossy(&files.stdout);
        assert!(files.lines().any(|f| f == "x.ts"));
        assert!(!files.contains(".gantry/runs"));
    }

    #[tokio::test]
    async fn test_git_publish_requires_repo() {
        let dir = TempDir::new().unwrap();
        let publisher = GitPublisher::new(dir.path());
        let result = publisher
            .publish(&PublishRequest {
                ticket_id: "T-1".to_string(),
                title: "x".to_string(),
            })
            .await;
        assert!(matches!(result, Err(CoreError::GitError(_))));
    }
}
