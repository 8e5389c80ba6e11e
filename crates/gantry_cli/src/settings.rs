//! Project configuration loaded from `gantry.yaml`.
//!
//! Every section is optional. Secrets never live here; they come from the
//! environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gantry_agents::{ContractConfig, ImplementationConfig};
use gantry_core::PipelineConfig;
use gantry_policy::GateConfig;
use gantry_tracker::{DEFAULT_IN_PROGRESS_STATUS, DEFAULT_READY_STATUS};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default configuration file name at the project root.
pub const CONFIG_FILE: &str = "gantry.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Base URL of the tracker REST API
    pub base_url: Option<String>,
    pub ready_status: String,
    pub in_progress_status: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            ready_status: DEFAULT_READY_STATUS.to_string(),
            in_progress_status: DEFAULT_IN_PROGRESS_STATUS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// `openai` or `anthropic`; detected from the environment when unset
    pub provider: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    pub enabled: bool,
    /// Remote to push to; unset commits locally only
    pub remote: Option<String>,
    pub branch_prefix: String,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            remote: Some("origin".to_string()),
            branch_prefix: "gantry".to_string(),
        }
    }
}

/// Contents of `gantry.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pipeline: PipelineConfig,
    pub contract: ContractConfig,
    pub implementation: ImplementationConfig,
    pub gate: GateConfig,
    pub tracker: TrackerSettings,
    pub llm: LlmSettings,
    pub publish: PublishSettings,
}

impl Settings {
    /// Load settings for a project.
    ///
    /// An explicit path must exist; the default `gantry.yaml` may be absent.
    pub fn load(project: &Path, explicit: Option<&Path>) -> Result<Self> {
        let (path, required): (PathBuf, bool) = match explicit {
            Some(p) if p.is_absolute() => (p.to_path_buf(), true),
            Some(p) => (project.join(p), true),
            None => (project.join(CONFIG_FILE), false),
        };

        if !path.exists() {
            if required {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            debug!("No {} found, using defaults", CONFIG_FILE);
            return Ok(Self::default());
        }

        info!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml::from_str(content)?;
        settings.gate.validate()?;
        Ok(settings)
    }
}
