//! Request/response surface for the three session operations
//!
//! Transport-agnostic: handlers take a caller-owned `Session` and return
//! serde types, so any HTTP or IPC layer can wrap them.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::session::Session;
use crate::tracker::{CreatedProject, Tracker};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResponse {
    pub markdown: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConverseRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseResponse {
    pub response: String,
    pub is_complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectResponse {
    pub message: String,
    pub project: CreatedProject,
}

/// Error body with the status code a transport should use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status: u16,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    fn new(status: u16, error: &str, details: Option<String>) -> Self {
        Self {
            status,
            error: error.to_string(),
            details,
        }
    }
}

impl From<&PipelineError> for ErrorResponse {
    fn from(err: &PipelineError) -> Self {
        match err {
            PipelineError::EmptyMessage => Self::new(400, "Message is required", None),
            PipelineError::UpstreamEmptyResponse { .. } | PipelineError::UpstreamTransport { .. } => {
                Self::new(502, "Upstream model request failed", Some(err.to_string()))
            }
            PipelineError::ProjectCreationFailed { .. } => {
                Self::new(500, "Failed to create project", Some(err.to_string()))
            }
            PipelineError::TranscriptWrite { .. } => Self::new(500, "Failed to generate markdown", Some(err.to_string())),
            PipelineError::Prompt(_) => Self::new(500, "Failed to render prompt", Some(err.to_string())),
        }
    }
}

/// Render (and persist) the session transcript
pub fn generate_transcript(session: &Session) -> Result<TranscriptResponse, ErrorResponse> {
    debug!(session_id = %session.id(), "generate_transcript: called");
    session
        .generate_transcript()
        .map(|markdown| TranscriptResponse { markdown })
        .map_err(|e| log_error("generate_transcript", e))
}

/// Submit one user message and return the interviewer's reply
pub async fn converse(session: &mut Session, request: ConverseRequest) -> Result<ConverseResponse, ErrorResponse> {
    debug!(session_id = %session.id(), message_len = request.message.len(), "converse: called");
    let reply = session
        .submit_turn(&request.message)
        .await
        .map_err(|e| log_error("converse", e))?;
    Ok(ConverseResponse {
        response: reply.response,
        is_complete: reply.is_complete,
    })
}

/// Run extraction and materialization for the session
pub async fn create_project(session: &Session, tracker: &dyn Tracker) -> Result<CreateProjectResponse, ErrorResponse> {
    debug!(session_id = %session.id(), "create_project: called");
    let project = session
        .run_pipeline(tracker)
        .await
        .map_err(|e| log_error("create_project", e))?;
    Ok(CreateProjectResponse {
        message: "Project created successfully".to_string(),
        project,
    })
}

fn log_error(operation: &str, err: PipelineError) -> ErrorResponse {
    warn!(%operation, error = %err, "Session operation failed");
    ErrorResponse::from(&err)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::Config;
    use crate::llm::client::mock::{MockLlmClient, MockReply};
    use crate::prompts::PromptLoader;
    use crate::session::SessionSettings;
    use crate::tracker::DryRunTracker;
    use crate::tracker::client::mock::FailingTracker;

    fn session(llm: MockLlmClient) -> Session {
        let settings = SessionSettings {
            transcript_path: None,
            ..SessionSettings::from(&Config::default())
        };
        Session::new(Arc::new(llm), Arc::new(PromptLoader::embedded_only()), settings)
    }

    #[tokio::test]
    async fn test_converse_empty_message_is_400() {
        let mut session = session(MockLlmClient::new(vec![]));
        let err = converse(&mut session, ConverseRequest::default()).await.unwrap_err();

        assert_eq!(err.status, 400);
        assert_eq!(err.error, "Message is required");
        assert!(session.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_converse_serializes_camel_case() {
        let mut session = session(MockLlmClient::texts(&["Thank you for providing all the necessary information."]));
        let response = converse(
            &mut session,
            ConverseRequest {
                message: "done".to_string(),
            },
        )
        .await
        .unwrap();

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["isComplete"], true);
        assert!(json.get("is_complete").is_none());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_502() {
        let mut session = session(MockLlmClient::new(vec![MockReply::Empty]));
        let err = converse(
            &mut session,
            ConverseRequest {
                message: "hi".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, 502);
        assert!(err.details.is_some());
    }

    #[test]
    fn test_generate_transcript_of_empty_session() {
        let session = session(MockLlmClient::new(vec![]));
        let response = generate_transcript(&session).unwrap();
        assert_eq!(response.markdown, "# Project Requirements\n\n");
    }

    #[tokio::test]
    async fn test_create_project_response() {
        let mut session = session(MockLlmClient::texts(&[
            "Thank you for providing all the necessary information.",
            r#"{"key": "CRM", "name": "Sales CRM", "epics": []}"#,
        ]));
        session.submit_turn("A CRM").await.unwrap();

        let response = create_project(&session, &DryRunTracker::new()).await.unwrap();
        assert_eq!(response.message, "Project created successfully");
        assert_eq!(response.project.key, "CRM");
    }

    #[tokio::test]
    async fn test_create_project_failure_has_details() {
        let mut session = session(MockLlmClient::texts(&[
            "Thank you for providing all the necessary information.",
            r#"{"key": "CRM", "name": "Sales CRM", "epics": []}"#,
        ]));
        session.submit_turn("A CRM").await.unwrap();

        let err = create_project(&session, &FailingTracker::new(1)).await.unwrap_err();
        assert_eq!(err.status, 500);
        assert_eq!(err.error, "Failed to create project");

        let body = serde_json::to_value(&err).unwrap();
        assert!(body.get("status").is_none());
        assert!(body["details"].as_str().unwrap().contains("project 'CRM'"));
    }
}
