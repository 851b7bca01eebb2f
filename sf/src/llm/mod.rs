//! Completion model client
//!
//! Provides the `LlmClient` seam and an OpenAI-compatible implementation
//! that serves both OpenAI and Azure OpenAI deployments.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, Message, ResponseFormat, Role, StopReason, TokenUsage};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
///
/// Supports "azure" and "openai" providers.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, "create_client: called");
    Ok(Arc::new(OpenAIClient::from_config(config)?))
}
