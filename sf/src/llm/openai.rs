//! Chat Completions client for OpenAI and Azure OpenAI
//!
//! Both providers speak the same request/response body; they differ only in
//! URL layout and auth header.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::LlmConfig;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Exponential backoff for the given (0-based) retry
fn backoff_delay(retry: u32) -> Duration {
    Duration::from_millis(INITIAL_BACKOFF_MS.saturating_mul(2u64.saturating_pow(retry)))
}

/// Where requests go and how they authenticate
#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint {
    /// `{base}/openai/deployments/{deployment}/chat/completions?api-version=...` with `api-key` header
    Azure { deployment: String, api_version: String },
    /// `{base}/v1/chat/completions` with bearer auth
    OpenAI { model: String },
}

/// OpenAI-compatible chat completions client
pub struct OpenAIClient {
    endpoint: Endpoint,
    api_key: String,
    base_url: String,
    http: Client,
    max_retries: u32,
}

impl OpenAIClient {
    /// Create a new client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(provider = %config.provider, "from_config: called");
        let api_key = config.get_api_key().map_err(|e| LlmError::Config(e.to_string()))?;

        let endpoint = match config.provider.as_str() {
            "azure" => Endpoint::Azure {
                deployment: config.deployment.clone(),
                api_version: config.api_version.clone(),
            },
            "openai" => Endpoint::OpenAI {
                model: config.model.clone(),
            },
            other => {
                return Err(LlmError::Config(format!(
                    "Unknown LLM provider: '{}'. Supported: azure, openai",
                    other
                )));
            }
        };

        let mut builder = Client::builder();
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let http = builder.build().map_err(LlmError::Network)?;

        Ok(Self {
            endpoint,
            api_key,
            base_url: config.base_url.clone(),
            http,
            max_retries: config.max_retries,
        })
    }

    /// Full URL for a chat completion call
    fn completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        match &self.endpoint {
            Endpoint::Azure {
                deployment,
                api_version,
            } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                base, deployment, api_version
            ),
            Endpoint::OpenAI { .. } => format!("{}/v1/chat/completions", base),
        }
    }

    /// Build the request body for the chat completions API
    ///
    /// Message order is system prompt, history, then the optional trailing
    /// user prompt.
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(message_count = %request.messages.len(), %request.max_tokens, "build_request_body: called");

        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": request.system_prompt,
        })];

        messages.extend(request.messages.iter().map(|m| {
            serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content,
            })
        }));

        if let Some(user_prompt) = &request.user_prompt {
            messages.push(serde_json::json!({
                "role": "user",
                "content": user_prompt,
            }));
        }

        let mut body = serde_json::json!({
            "messages": messages,
            "max_tokens": request.max_tokens,
        });

        if let Endpoint::OpenAI { model } = &self.endpoint {
            body["model"] = serde_json::json!(model);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(top_p) = request.top_p {
            body["top_p"] = serde_json::json!(top_p);
        }
        if let Some(format) = request.response_format.to_openai_schema() {
            body["response_format"] = format;
        }

        body
    }

    /// Parse the API response, rejecting an empty choice list
    fn parse_response(&self, api_response: OpenAIResponse) -> Result<CompletionResponse, LlmError> {
        debug!(choice_count = %api_response.choices.len(), "parse_response: called");
        let choice = api_response.choices.into_iter().next().ok_or(LlmError::EmptyChoices)?;
        let usage = api_response.usage.unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content,
            stop_reason: StopReason::from_openai(choice.finish_reason.as_deref()),
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }

    /// How long to wait before retrying after `err`, or None to give up
    ///
    /// Rate limits wait for the server's `retry-after`; other transient
    /// failures back off exponentially.
    fn retry_delay(&self, err: &LlmError, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries || !err.is_retryable() {
            return None;
        }
        Some(err.retry_after().unwrap_or_else(|| backoff_delay(attempt)))
    }

    /// One HTTP round trip, with the status mapped onto `LlmError`
    async fn send_once(&self, url: &str, body: &serde_json::Value) -> Result<CompletionResponse, LlmError> {
        let response = self
            .authorize(self.http.post(url))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            debug!(retry_after, "send_once: rate limited (429)");
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(status, "send_once: API error");
            return Err(LlmError::ApiError { status, message });
        }

        let api_response: OpenAIResponse = response.json().await?;
        self.parse_response(api_response)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.endpoint {
            Endpoint::Azure { .. } => builder.header("api-key", &self.api_key),
            Endpoint::OpenAI { .. } => builder.bearer_auth(&self.api_key),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%request.max_tokens, "complete: called");
        let url = self.completions_url();
        let body = self.build_request_body(&request);

        for attempt in 0..=self.max_retries {
            let err = match self.send_once(&url, &body).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };
            let Some(delay) = self.retry_delay(&err, attempt) else {
                return Err(err);
            };
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                rate_limited = err.is_rate_limit(),
                error = %err,
                "complete: retrying after transient error"
            );
            tokio::time::sleep(delay).await;
        }

        Err(LlmError::InvalidResponse("Max retries exceeded".to_string()))
    }
}

// Chat completions response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
