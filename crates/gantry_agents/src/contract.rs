//! Contract stage: generate the shared interface and persistence fragment.

use std::sync::Arc;

use async_trait::async_trait;
use gantry_core::{
    names, truncate_for_log, CoreResult, PipelineState, Stage, StateDelta, Status, Workspace,
};
use gantry_llm::GenerationClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AgentError, AgentResult};
use crate::parse::{parse_contract, ParseError};
use crate::prompts;
use crate::schema::{SchemaWriteMode, SchemaWriter, DEFAULT_SCHEMA_PATH};

/// Contract location used when the response declares none.
pub const DEFAULT_CONTRACT_PATH: &str = "packages/shared/src/contracts/contract.ts";

/// Contract stage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    pub default_path: String,
    pub schema_path: String,
    pub schema_mode: SchemaWriteMode,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            default_path: DEFAULT_CONTRACT_PATH.to_string(),
            schema_path: DEFAULT_SCHEMA_PATH.to_string(),
            schema_mode: SchemaWriteMode::default(),
        }
    }
}

/// Generates the interface definition every implementation conforms to.
pub struct ContractStage {
    generator: Arc<dyn GenerationClient>,
    workspace: Arc<Workspace>,
    config: ContractConfig,
}

impl ContractStage {
    pub fn new(generator: Arc<dyn GenerationClient>, workspace: Arc<Workspace>) -> Self {
        Self {
            generator,
            workspace,
            config: ContractConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ContractConfig) -> Self {
        self.config = config;
        self
    }

    async fn run(&self, task: &str) -> AgentResult<String> {
        let response = self
            .generator
            .generate(&prompts::contract_system(), &prompts::contract_user(task))
            .await?;
        debug!("Contract response: {}", truncate_for_log(&response, 400));

        let doc = parse_contract(&response)?;

        let path = match doc.path {
            Some(path) => path,
            None => {
                warn!(
                    "{}, using default {}",
                    ParseError::MissingPathHeader,
                    self.config.default_path
                );
                self.config.default_path.clone()
            }
        };

        self.workspace.write(&path, &doc.body)?;
        info!("Wrote contract to {}", path);

        match doc.fragment {
            Ok(fragment) => {
                SchemaWriter::new(
                    self.workspace.clone(),
                    self.config.schema_path.clone(),
                    self.config.schema_mode,
                )
                .write(&fragment)?;
            }
            Err(ParseError::MissingMarker) => {
                warn!("{}, skipping schema update", ParseError::MissingMarker);
            }
            Err(other) => return Err(AgentError::Parse(other)),
        }

        Ok(path)
    }
}

#[async_trait]
impl Stage for ContractStage {
    fn name(&self) -> &str {
        names::CONTRACT
    }

    fn description(&self) -> &str {
        "Generates the shared interface definition and schema fragment"
    }

    async fn execute(&self, state: &PipelineState) -> CoreResult<StateDelta> {
        let Some(task) = state.task.as_deref() else {
            warn!("Contract stage reached without a task");
            return Ok(StateDelta::status(Status::Error));
        };

        let path = self
            .run(task)
            .await
            .map_err(|e| e.into_core(names::CONTRACT))?;

        Ok(StateDelta::status(Status::ContractLocked).with_contract_path(path))
    }
}
