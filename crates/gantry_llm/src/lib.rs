//! # gantry_llm
//!
//! Text generation clients for Gantry.
//!
//! Stages depend only on [`GenerationClient`]. [`LlmAdapter`] calls the
//! OpenAI or Anthropic chat APIs with retries; [`ScriptedGenerator`] returns
//! queued responses for tests.

pub mod adapter;
pub mod client;
pub mod error;
pub mod scripted;

pub use adapter::{LlmAdapter, LlmProvider, LlmResponse};
pub use client::GenerationClient;
pub use error::{LlmError, LlmResult};
pub use scripted::{GenerationCall, ScriptedGenerator};
