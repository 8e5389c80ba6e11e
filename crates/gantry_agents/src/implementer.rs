//! Implementation stage: generate or repair one artifact per mode.

use std::sync::Arc;

use async_trait::async_trait;
use gantry_core::{
    names, truncate_for_log, CoreResult, Mode, PipelineState, Stage, StateDelta, Status,
    Workspace,
};
use gantry_llm::GenerationClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AgentError, AgentResult};
use crate::parse::strip_code_fences;
use crate::prompts;
use crate::routing::RoutingTable;

/// Default location of the project rules document.
pub const DEFAULT_RULES_PATH: &str = ".gantry/rules.md";

/// Implementation stage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImplementationConfig {
    pub rules_path: String,
    pub routes: RoutingTable,
}

impl Default for ImplementationConfig {
    fn default() -> Self {
        Self {
            rules_path: DEFAULT_RULES_PATH.to_string(),
            routes: RoutingTable::default(),
        }
    }
}

/// Writes the backend or frontend artifact for the locked contract.
///
/// With a pending failure report the stage repairs the existing artifact
/// instead of generating it from scratch.
pub struct ImplementationStage {
    generator: Arc<dyn GenerationClient>,
    workspace: Arc<Workspace>,
    config: ImplementationConfig,
}

impl ImplementationStage {
    pub fn new(generator: Arc<dyn GenerationClient>, workspace: Arc<Workspace>) -> Self {
        Self {
            generator,
            workspace,
            config: ImplementationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ImplementationConfig) -> Self {
        self.config = config;
        self
    }

    fn read_or_empty(&self, path: &str, what: &str) -> AgentResult<String> {
        match self.workspace.read_optional(path)? {
            Some(content) => Ok(content),
            None => {
                warn!("{} {} not found, using empty text", what, path);
                Ok(String::new())
            }
        }
    }

    async fn run(&self, state: &PipelineState) -> AgentResult<String> {
        let contract_path = state
            .contract_path
            .as_deref()
            .ok_or_else(|| AgentError::missing_input(names::IMPLEMENT, "contract_path"))?;
        let mode = state.mode;

        let contract = self.workspace.read(contract_path)?;
        let rules = self.read_or_empty(&self.config.rules_path, "Rules document")?;
        let target = self.config.routes.resolve(contract_path, mode);

        let (system, user) = match state.error_text() {
            Some(report) => {
                info!("Repairing {} artifact {}", mode, target);
                let existing = self.read_or_empty(&target, "Artifact")?;
                (
                    prompts::repair_system(mode),
                    prompts::repair_user(&contract, &rules, &target, &existing, report),
                )
            }
            None => {
                info!("Generating {} artifact {}", mode, target);
                (
                    prompts::implement_system(mode).to_string(),
                    prompts::implement_user(
                        state.task.as_deref().unwrap_or_default(),
                        &contract,
                        &rules,
                        &target,
                    ),
                )
            }
        };

        let response = self.generator.generate(&system, &user).await?;
        debug!("{} response: {}", mode, truncate_for_log(&response, 400));

        self.workspace.write(&target, &strip_code_fences(&response))?;
        Ok(target)
    }

    /// Artifact path for a mode, given the contract location.
    pub fn target_for(&self, contract_path: &str, mode: Mode) -> String {
        self.config.routes.resolve(contract_path, mode)
    }
}

#[async_trait]
impl Stage for ImplementationStage {
    fn name(&self) -> &str {
        names::IMPLEMENT
    }

    fn description(&self) -> &str {
        "Generates or repairs the backend and frontend artifacts"
    }

    async fn execute(&self, state: &PipelineState) -> CoreResult<StateDelta> {
        let target = self
            .run(state)
            .await
            .map_err(|e| e.into_core(names::IMPLEMENT))?;
        info!("Wrote {}", target);

        Ok(StateDelta::status(Status::Done(state.mode))
            .clear_error()
            .with_mode(state.mode.next()))
    }
}
