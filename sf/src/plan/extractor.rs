//! PlanExtractor - transcript to ProjectPlan
//!
//! Asks the model for plan JSON. When the response is not a valid plan the
//! transcript itself is run through the heading parser instead.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::fallback::parse_markdown;
use super::model::{MAX_KEY_LEN, ProjectPlan};
use crate::config::SamplingConfig;
use crate::error::{PipelineError, Stage};
use crate::llm::{CompletionRequest, LlmClient, ResponseFormat, StopReason};
use crate::prompts::{PromptContext, PromptLoader};

/// Which path produced a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    Model,
    Fallback,
}

/// A plan together with the path that produced it
#[derive(Debug, Clone)]
pub struct Extraction {
    pub plan: ProjectPlan,
    pub source: PlanSource,
    /// The model stopped at its token limit
    pub truncated: bool,
}

/// Converts transcripts into plans
pub struct PlanExtractor {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    sampling: SamplingConfig,
}

impl PlanExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, sampling: SamplingConfig) -> Self {
        Self { llm, prompts, sampling }
    }

    /// Extract a plan from a transcript document
    ///
    /// Model failures (transport, empty response) propagate. Malformed or
    /// schema-invalid JSON falls back to parsing the transcript.
    pub async fn extract(&self, transcript: &str) -> Result<Extraction, PipelineError> {
        info!(transcript_len = transcript.len(), "Extracting project plan");
        let system_prompt = self.prompts.render(
            "extract",
            &PromptContext::new().set("max_key_len", MAX_KEY_LEN.to_string()),
        )?;

        let format = if self.sampling.json_mode {
            ResponseFormat::JsonObject
        } else {
            ResponseFormat::Text
        };
        let request = CompletionRequest::new(system_prompt, vec![], self.sampling.max_tokens)
            .with_user_prompt(transcript)
            .with_sampling(self.sampling.temperature, self.sampling.top_p)
            .with_response_format(format);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|e| PipelineError::from_llm(Stage::Extraction, e))?;

        let content = response.text_content().ok_or(PipelineError::UpstreamEmptyResponse {
            stage: Stage::Extraction,
        })?;
        let truncated = response.stop_reason == StopReason::MaxTokens;
        debug!(
            content_len = content.len(),
            output_tokens = response.usage.output_tokens,
            truncated,
            "extract: model responded"
        );
        if truncated {
            warn!(
                max_tokens = self.sampling.max_tokens,
                output_tokens = response.usage.output_tokens,
                "Plan response hit the token limit; raise llm.extraction.max-tokens if the plan is incomplete"
            );
        }

        match ProjectPlan::from_json(content) {
            Ok(plan) => {
                info!(key = %plan.key, epic_count = plan.epics.len(), "Plan extracted from model response");
                Ok(Extraction {
                    plan,
                    source: PlanSource::Model,
                    truncated,
                })
            }
            Err(e) => {
                warn!(error = %e, "Model plan unusable, falling back to heading parser");
                let plan = parse_markdown(transcript);
                info!(key = %plan.key, epic_count = plan.epics.len(), "Plan extracted by fallback parser");
                Ok(Extraction {
                    plan,
                    source: PlanSource::Fallback,
                    truncated,
                })
            }
        }
    }
}
