//! LLM adapter for chat completions.
//!
//! Supports OpenAI and Anthropic APIs, selected via environment variables
//! or configuration.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::GenerationClient;
use crate::error::{LlmError, LlmResult};

/// Environment variable overriding the default model.
pub const MODEL_ENV: &str = "GANTRY_LLM_MODEL";

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    /// Environment variable holding this provider's API key.
    pub fn key_env(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "gpt-5-mini",
            LlmProvider::Anthropic => "claude-sonnet-4-5",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "anthropic" => Ok(LlmProvider::Anthropic),
            other => Err(LlmError::UnknownProvider(other.to_string())),
        }
    }
}

/// Longest wait between two attempts.
const MAX_BACKOFF_SECS: u64 = 60;

/// Delay before retry number `attempt` (1-based).
fn backoff_delay(attempt: u32) -> Duration {
    let secs = 1u64
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX)
        .min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}

/// LLM adapter that handles API calls
pub struct LlmAdapter {
    provider: LlmProvider,
    api_key: String,
    model: String,
    max_tokens: u32,
    max_retries: u32,
    client: reqwest::Client,
}

/// Response from LLM including usage info
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub model: String,
}

/// Outcome of one HTTP attempt.
enum Attempt {
    Done(LlmResponse),
    Retry(LlmError),
}

impl LlmAdapter {
    /// Create a new LLM adapter with explicit configuration
    pub fn new(provider: LlmProvider, api_key: String, model: Option<String>) -> Self {
        Self {
            provider,
            api_key,
            model: model.unwrap_or_else(|| provider.default_model().to_string()),
            max_tokens: 8192,
            max_retries: 3,
            client: reqwest::Client::new(),
        }
    }

    /// Create an LLM adapter from environment variables
    ///
    /// Checks in order:
    /// 1. OPENAI_API_KEY
    /// 2. ANTHROPIC_API_KEY
    pub fn from_env() -> LlmResult<Self> {
        let custom_model = std::env::var(MODEL_ENV).ok().filter(|m| !m.is_empty());

        for provider in [LlmProvider::OpenAI, LlmProvider::Anthropic] {
            if let Ok(api_key) = std::env::var(provider.key_env()) {
                if !api_key.is_empty() {
                    return Ok(Self::new(provider, api_key, custom_model));
                }
            }
        }

        Err(LlmError::LlmNotConfigured)
    }

    /// Create an adapter for a configured provider, falling back to
    /// environment detection when none is named.
    ///
    /// An explicit model wins over `GANTRY_LLM_MODEL`.
    pub fn from_config(provider: Option<&str>, model: Option<String>) -> LlmResult<Self> {
        let Some(name) = provider else {
            let adapter = Self::from_env()?;
            return Ok(match model {
                Some(model) => adapter.with_model(model),
                None => adapter,
            });
        };

        let provider: LlmProvider = name.parse()?;
        let api_key = std::env::var(provider.key_env())
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::LlmNotConfigured)?;
        let model = model.or_else(|| std::env::var(MODEL_ENV).ok().filter(|m| !m.is_empty()));
        Ok(Self::new(provider, api_key, model))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Get the current provider
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Get the current model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Complete a system/user instruction pair.
    ///
    /// Network errors, 5xx responses and rate limits are retried with
    /// exponential backoff (1s, 2s, 4s, ...), capped at a minute.
    pub async fn complete(&self, system: &str, user: &str) -> LlmResult<LlmResponse> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                debug!("Retrying generation in {:?}", delay);
                tokio::time::sleep(delay).await;
            }

            let outcome = match self.provider {
                LlmProvider::OpenAI => self.attempt_openai(system, user, attempt).await?,
                LlmProvider::Anthropic => self.attempt_anthropic(system, user, attempt).await?,
            };

            match outcome {
                Attempt::Done(response) => {
                    debug!(
                        "Generated {} chars ({} in / {} out tokens)",
                        response.content.len(),
                        response.input_tokens,
                        response.output_tokens
                    );
                    return Ok(response);
                }
                Attempt::Retry(err) => {
                    warn!("{}", err);
                    last_error = Some(err);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::GenerationFailed("Max retries exceeded".to_string())))
    }

    async fn attempt_openai(&self, system: &str, user: &str, attempt: u32) -> LlmResult<Attempt> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            max_completion_tokens: Some(self.max_tokens),
        };

        let response = match self
            .client
            .post(OPENAI_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                return Ok(Attempt::Retry(LlmError::GenerationFailed(format!(
                    "Network error: {}",
                    e
                ))))
            }
        };

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            let body = response.text().await.unwrap_or_default();
            return Ok(Attempt::Retry(LlmError::GenerationFailed(format!(
                "OpenAI API error {} (attempt {}/{}): {}",
                status,
                attempt + 1,
                self.max_retries,
                body
            ))));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::GenerationFailed(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LlmError::GenerationFailed(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::GenerationFailed("No response from OpenAI".to_string()))?;
        let (input_tokens, output_tokens) = result
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(Attempt::Done(LlmResponse {
            content,
            input_tokens,
            output_tokens,
            model: self.model.clone(),
        }))
    }

    async fn attempt_anthropic(
        &self,
        system: &str,
        user: &str,
        attempt: u32,
    ) -> LlmResult<Attempt> {
        // Anthropic takes the system instruction outside the message list
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(system.to_string()).filter(|s| !s.is_empty()),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        let response = match self
            .client
            .post(ANTHROPIC_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                return Ok(Attempt::Retry(LlmError::GenerationFailed(format!(
                    "Network error: {}",
                    e
                ))))
            }
        };

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            let body = response.text().await.unwrap_or_default();
            return Ok(Attempt::Retry(LlmError::GenerationFailed(format!(
                "Anthropic API error {} (attempt {}/{}): {}",
                status,
                attempt + 1,
                self.max_retries,
                body
            ))));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::GenerationFailed(format!(
                "Anthropic API error {}: {}",
                status, body
            )));
        }

        let result: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::GenerationFailed(format!("Failed to parse response: {}", e)))?;

        let content: String = result
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");
        if content.is_empty() {
            return Err(LlmError::GenerationFailed(
                "No response from Anthropic".to_string(),
            ));
        }
        let (input_tokens, output_tokens) = result
            .usage
            .map(|u| (u.input_tokens, u.output_tokens))
            .unwrap_or((0, 0));

        Ok(Attempt::Done(LlmResponse {
            content,
            input_tokens,
            output_tokens,
            model: self.model.clone(),
        }))
    }
}

#[async_trait]
impl GenerationClient for LlmAdapter {
    async fn generate(&self, system: &str, user: &str) -> LlmResult<String> {
        Ok(self.complete(system, user).await?.content)
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: String,
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}
