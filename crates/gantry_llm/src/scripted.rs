//! Scripted generator for tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::client::GenerationClient;
use crate::error::{LlmError, LlmResult};

/// A recorded generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationCall {
    pub system: String,
    pub user: String,
}

/// Generator returning queued responses in order and recording every call.
///
/// Once the queue is empty the fallback response is returned, or
/// [`LlmError::ScriptExhausted`] if there is none.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: RwLock<VecDeque<LlmResult<String>>>,
    fallback: Option<String>,
    calls: RwLock<Vec<GenerationCall>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<impl Into<String>>) -> Self {
        let generator = Self::new();
        for response in responses {
            generator.push(response);
        }
        generator
    }

    /// Respond with this text whenever the queue is empty.
    pub fn with_fallback(mut self, response: impl Into<String>) -> Self {
        self.fallback = Some(response.into());
        self
    }

    pub fn push(&self, response: impl Into<String>) {
        self.responses.write().push_back(Ok(response.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, message: impl Into<String>) {
        self.responses
            .write()
            .push_back(Err(LlmError::GenerationFailed(message.into())));
    }

    pub fn calls(&self) -> Vec<GenerationCall> {
        self.calls.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().len()
    }
}

#[async_trait]
impl GenerationClient for ScriptedGenerator {
    async fn generate(&self, system: &str, user: &str) -> LlmResult<String> {
        let count = {
            let mut calls = self.calls.write();
            calls.push(GenerationCall {
                system: system.to_string(),
                user: user.to_string(),
            });
            calls.len()
        };

        if let Some(next) = self.responses.write().pop_front() {
            return next;
        }
        self.fallback
            .clone()
            .ok_or(LlmError::ScriptExhausted(count))
    }
}
