//! Generation client trait.

use async_trait::async_trait;

use crate::error::LlmResult;

/// Turns a system/user instruction pair into generated text.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> LlmResult<String>;
}
