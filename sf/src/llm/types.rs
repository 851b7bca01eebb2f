//! LLM request/response types for storyforge
//!
//! These types model the Chat Completions API shape shared by OpenAI and
//! Azure OpenAI deployments.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt (rendered from Handlebars template)
    pub system_prompt: String,

    /// Accumulated dialogue, oldest first
    pub messages: Vec<Message>,

    /// Optional trailing user prompt sent after the history
    pub user_prompt: Option<String>,

    /// Sampling temperature (provider default when unset)
    pub temperature: Option<f32>,

    /// Nucleus sampling cutoff (provider default when unset)
    pub top_p: Option<f32>,

    /// Max tokens for response
    pub max_tokens: u32,

    /// Hint for the shape of the response body
    pub response_format: ResponseFormat,
}

impl CompletionRequest {
    /// Create a request with just a system prompt and history
    pub fn new(system_prompt: impl Into<String>, messages: Vec<Message>, max_tokens: u32) -> Self {
        debug!(message_count = %messages.len(), %max_tokens, "CompletionRequest::new: called");
        Self {
            system_prompt: system_prompt.into(),
            messages,
            user_prompt: None,
            temperature: None,
            top_p: None,
            max_tokens,
            response_format: ResponseFormat::Text,
        }
    }

    /// Append a trailing user prompt after the history
    pub fn with_user_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.user_prompt = Some(prompt.into());
        self
    }

    /// Set temperature and top_p
    pub fn with_sampling(mut self, temperature: Option<f32>, top_p: Option<f32>) -> Self {
        self.temperature = temperature;
        self.top_p = top_p;
        self
    }

    /// Set the response format hint
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }
}

/// Response format hint passed to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    JsonObject,
}

impl ResponseFormat {
    /// Wire representation for the `response_format` field
    pub fn to_openai_schema(&self) -> Option<serde_json::Value> {
        match self {
            ResponseFormat::Text => None,
            ResponseFormat::JsonObject => Some(serde_json::json!({ "type": "json_object" })),
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        debug!("Message::assistant: called");
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name used by the chat completions API
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content of the first choice (if any)
    pub content: Option<String>,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage for cost tracking
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Build a plain text response (used by tests and dry runs)
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    /// Non-blank text content, if the model produced any
    pub fn text_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    ContentFilter,
}

impl StopReason {
    /// Parse from the chat completions `finish_reason` string
    pub fn from_openai(s: Option<&str>) -> Self {
        debug!(?s, "StopReason::from_openai: called");
        match s {
            Some("length") => StopReason::MaxTokens,
            Some("content_filter") => StopReason::ContentFilter,
            _ => StopReason::EndTurn,
        }
    }
}

/// Token usage for cost tracking
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
