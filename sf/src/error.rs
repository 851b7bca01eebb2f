//! Pipeline error taxonomy

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::llm::LlmError;
use crate::prompts::PromptError;
use crate::tracker::TrackerError;

/// Pipeline stage that talks to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Conversation,
    Extraction,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Conversation => write!(f, "conversation"),
            Stage::Extraction => write!(f, "plan extraction"),
        }
    }
}

/// Tracker call that was in flight when materialization stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationStep {
    Project { key: String },
    Epic { name: String },
    Story { name: String, epic_key: String },
    Subtask { name: String, story_key: String },
}

impl fmt::Display for CreationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreationStep::Project { key } => write!(f, "project '{}'", key),
            CreationStep::Epic { name } => write!(f, "epic '{}'", name),
            CreationStep::Story { name, epic_key } => write!(f, "story '{}' under {}", name, epic_key),
            CreationStep::Subtask { name, story_key } => write!(f, "subtask '{}' under {}", name, story_key),
        }
    }
}

/// Errors surfaced by the conversation-to-tracker pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage}: model returned an empty response")]
    UpstreamEmptyResponse { stage: Stage },

    #[error("{stage}: model request failed: {source}")]
    UpstreamTransport {
        stage: Stage,
        #[source]
        source: LlmError,
    },

    #[error("Project creation failed at {step}: {source}")]
    ProjectCreationFailed {
        step: CreationStep,
        #[source]
        source: TrackerError,
    },

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("Failed to write transcript {path}: {source}")]
    TranscriptWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Message is required")]
    EmptyMessage,
}

impl PipelineError {
    /// Attach stage context to a model client failure
    pub fn from_llm(stage: Stage, err: LlmError) -> Self {
        match err {
            LlmError::EmptyChoices => PipelineError::UpstreamEmptyResponse { stage },
            source => PipelineError::UpstreamTransport { stage, source },
        }
    }

    /// Tracker step that failed, if this is a creation failure
    pub fn failed_step(&self) -> Option<&CreationStep> {
        match self {
            PipelineError::ProjectCreationFailed { step, .. } => Some(step),
            _ => None,
        }
    }
}
