//! Session - one requirements conversation and its pipeline
//!
//! A session owns its `Conversation`. The interview loop appends a user turn,
//! asks the model for the next assistant turn and appends that, until the
//! assistant says the completion phrase. The transcript, plan extraction and
//! materialization stages then read the conversation without changing it.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{Config, SamplingConfig};
use crate::conversation::{COMPLETION_PHRASE, Conversation, format_transcript, is_complete, write_transcript};
use crate::error::{PipelineError, Stage};
use crate::llm::{CompletionRequest, LlmClient};
use crate::materialize::Materializer;
use crate::plan::{Extraction, PlanExtractor};
use crate::prompts::{PromptContext, PromptLoader};
use crate::tracker::{CreatedProject, Tracker};

/// Per-session settings taken from config
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub conversation: SamplingConfig,
    pub extraction: SamplingConfig,
    pub transcript_path: Option<PathBuf>,
    pub custom_instruction: Option<String>,
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            conversation: config.llm.conversation.clone(),
            extraction: config.llm.extraction.clone(),
            transcript_path: config.session.transcript_path.clone(),
            custom_instruction: config.session.custom_instruction.clone(),
        }
    }
}

/// Assistant reply to one submitted turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReply {
    pub response: String,
    pub is_complete: bool,
}

/// One requirements-gathering session
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    conversation: Conversation,
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    settings: SessionSettings,
}

impl Session {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, settings: SessionSettings) -> Self {
        let id = Uuid::now_v7();
        let started_at = Utc::now();
        info!(session_id = %id, %started_at, "Starting requirements session");
        Self {
            id,
            started_at,
            conversation: Conversation::new(),
            llm,
            prompts,
            settings,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Time since the session started
    pub fn elapsed(&self) -> TimeDelta {
        Utc::now() - self.started_at
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Append a user turn without contacting the model
    pub fn append_user_turn(&mut self, text: impl Into<String>) {
        self.conversation.push_user(text);
    }

    /// Ask the model for the next assistant turn and append it
    ///
    /// On failure the conversation is left exactly as it was.
    pub async fn request_assistant_turn(&mut self) -> Result<String, PipelineError> {
        debug!(session_id = %self.id, turn_count = self.conversation.len(), "request_assistant_turn: called");
        let system_prompt = self.prompts.render(
            "interview",
            &PromptContext::new()
                .set("completion_phrase", COMPLETION_PHRASE)
                .set_opt("custom_instruction", self.settings.custom_instruction.as_deref()),
        )?;

        let sampling = &self.settings.conversation;
        let request = CompletionRequest::new(system_prompt, self.conversation.to_messages(), sampling.max_tokens)
            .with_sampling(sampling.temperature, sampling.top_p);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|e| PipelineError::from_llm(Stage::Conversation, e))?;

        let text = response
            .text_content()
            .ok_or(PipelineError::UpstreamEmptyResponse {
                stage: Stage::Conversation,
            })?
            .to_string();

        self.conversation.push_assistant(text.clone());
        Ok(text)
    }

    /// Submit one user message and get the assistant's reply
    ///
    /// The user turn stays in the conversation even if the model call fails.
    pub async fn submit_turn(&mut self, text: &str) -> Result<TurnReply, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyMessage);
        }
        self.append_user_turn(text);
        let response = self.request_assistant_turn().await?;
        let is_complete = is_complete(&response);
        if is_complete {
            info!(session_id = %self.id, turn_count = self.conversation.len(), "Interviewer signalled completion");
        }
        Ok(TurnReply { response, is_complete })
    }

    /// Whether the latest assistant turn carries the completion phrase
    pub fn is_complete(&self) -> bool {
        self.conversation
            .turns()
            .iter()
            .rev()
            .find(|t| t.role() == crate::llm::Role::Assistant)
            .is_some_and(|t| is_complete(t.content()))
    }

    /// Render the transcript without side effects
    pub fn transcript(&self) -> String {
        format_transcript(&self.conversation)
    }

    /// Render the transcript and persist it to the configured path
    pub fn generate_transcript(&self) -> Result<String, PipelineError> {
        let markdown = self.transcript();
        if let Some(path) = &self.settings.transcript_path {
            write_transcript(path, &markdown).map_err(|source| PipelineError::TranscriptWrite {
                path: path.clone(),
                source,
            })?;
        }
        Ok(markdown)
    }

    pub fn extractor(&self) -> PlanExtractor {
        PlanExtractor::new(self.llm.clone(), self.prompts.clone(), self.settings.extraction.clone())
    }

    /// Transcript to plan, without touching the tracker
    pub async fn extract_plan(&self) -> Result<Extraction, PipelineError> {
        let transcript = self.generate_transcript()?;
        self.extractor().extract(&transcript).await
    }

    /// Transcript, plan extraction and materialization in one go
    pub async fn run_pipeline(&self, tracker: &dyn Tracker) -> Result<CreatedProject, PipelineError> {
        info!(
            session_id = %self.id,
            started_at = %self.started_at,
            elapsed_secs = self.elapsed().num_seconds(),
            turn_count = self.conversation.len(),
            "Running project pipeline"
        );
        let extraction = self.extract_plan().await?;
        info!(source = ?extraction.source, key = %extraction.plan.key, "Plan ready for materialization");
        Materializer::new(tracker).materialize(extraction.plan).await
    }
}
