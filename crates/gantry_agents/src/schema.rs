//! Writing persistence-model fragments into the shared schema file.

use std::sync::Arc;

use gantry_core::Workspace;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AgentResult;
use crate::parse::{find_model_block, SchemaFragment};

/// Default location of the shared schema file.
pub const DEFAULT_SCHEMA_PATH: &str = "prisma/schema.prisma";

/// How a fragment lands in the schema file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchemaWriteMode {
    /// Append every fragment; re-running duplicates the model
    #[default]
    Append,
    /// Replace an existing block for the same model name, else append
    Upsert,
}

/// Writes fragments to one schema file inside the workspace.
pub struct SchemaWriter {
    workspace: Arc<Workspace>,
    path: String,
    mode: SchemaWriteMode,
}

impl SchemaWriter {
    pub fn new(workspace: Arc<Workspace>, path: impl Into<String>, mode: SchemaWriteMode) -> Self {
        Self {
            workspace,
            path: path.into(),
            mode,
        }
    }

    pub fn write(&self, fragment: &SchemaFragment) -> AgentResult<()> {
        match self.mode {
            SchemaWriteMode::Append => {
                info!("Appending model {} to {}", fragment.model_name, self.path);
                self.workspace
                    .append(&self.path, &format!("\n{}\n", fragment.text))?;
            }
            SchemaWriteMode::Upsert => {
                let existing = self.workspace.read_optional(&self.path)?.unwrap_or_default();
                match find_model_block(&existing, &fragment.model_name) {
                    Some((start, end)) => {
                        info!("Replacing model {} in {}", fragment.model_name, self.path);
                        let updated =
                            format!("{}{}{}", &existing[..start], fragment.text, &existing[end..]);
                        self.workspace.write(&self.path, &updated)?;
                    }
                    None => {
                        debug!("Model {} not present, appending", fragment.model_name);
                        self.workspace
                            .append(&self.path, &format!("\n{}\n", fragment.text))?;
                    }
                }
            }
        }
        Ok(())
    }
}
