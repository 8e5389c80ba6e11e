//! REST tracker client.
//!
//! Talks to a tracker exposing:
//!
//! - `GET {base}/issues?status=<ready>` returning a JSON array of work items
//!   (or an object with an `issues` array)
//! - `PATCH {base}/issues/{id}` with body `{"status": "<new status>"}`
//!
//! Requests carry a bearer token read from `GANTRY_TRACKER_TOKEN`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::TicketClient;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{WorkItem, DEFAULT_READY_STATUS};

/// Environment variable holding the tracker credential.
pub const TOKEN_ENV: &str = "GANTRY_TRACKER_TOKEN";

/// HTTP tracker client.
pub struct HttpTracker {
    base_url: String,
    token: String,
    ready_status: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IssueList {
    Bare(Vec<WorkItem>),
    Wrapped { issues: Vec<WorkItem> },
}

impl HttpTracker {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            ready_status: DEFAULT_READY_STATUS.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client with the token taken from the environment.
    pub fn from_env(base_url: impl Into<String>) -> TrackerResult<Self> {
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.is_empty() => Ok(Self::new(base_url, token)),
            _ => Err(TrackerError::NotConfigured(format!("{} is not set", TOKEN_ENV))),
        }
    }

    pub fn with_ready_status(mut self, status: impl Into<String>) -> Self {
        self.ready_status = status.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/issues/{id}` with the id encoded as a single path segment.
    fn issue_url(&self, id: &str) -> TrackerResult<reqwest::Url> {
        let invalid = |reason: String| {
            TrackerError::Request(format!("invalid tracker URL '{}': {}", self.base_url, reason))
        };
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be a base".to_string()))?
            .pop_if_empty()
            .push("issues")
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl TicketClient for HttpTracker {
    async fn fetch_ready(&self) -> TrackerResult<Vec<WorkItem>> {
        let url = format!("{}/issues", self.base_url);
        debug!("GET {} status={}", url, self.ready_status);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("status", self.ready_status.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let list: IssueList = response
            .json()
            .await
            .map_err(|e| TrackerError::InvalidResponse(e.to_string()))?;

        Ok(match list {
            IssueList::Bare(items) => items,
            IssueList::Wrapped { issues } => issues,
        })
    }

    async fn update_status(&self, id: &str, status: &str) -> TrackerResult<bool> {
        let url = self.issue_url(id)?;
        debug!("PATCH {} status={}", url, status);

        let response = self
            .client
            .patch(url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await?;

        let code = response.status();
        if !code.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Tracker refused status update for {}: {} {}", id, code, body);
            return Ok(false);
        }

        Ok(true)
    }
}
