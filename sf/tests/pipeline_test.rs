//! End-to-end pipeline tests through the public API
//!
//! A scripted model client and a recording tracker stand in for the remote
//! services.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use storyforge::api::{self, ConverseRequest};
use storyforge::config::Config;
use storyforge::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use storyforge::session::{Session, SessionSettings};
use storyforge::tracker::{CreatedIssue, CreatedProject, IssueKind, NewIssue, NewProject, Tracker, TrackerError};
use storyforge::{COMPLETION_PHRASE, PipelineError, PromptLoader};

// =============================================================================
// Test doubles
// =============================================================================

struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(text) => Ok(CompletionResponse::text(text)),
            None => Err(LlmError::EmptyChoices),
        }
    }
}

/// Records (kind, summary, parent) and hands out `<KEY>-<n>` keys
#[derive(Default)]
struct RecordingTracker {
    log: Mutex<Vec<(String, String, Option<String>)>>,
}

impl RecordingTracker {
    fn log(&self) -> Vec<(String, String, Option<String>)> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tracker for RecordingTracker {
    async fn create_project(&self, project: NewProject) -> Result<CreatedProject, TrackerError> {
        self.log
            .lock()
            .unwrap()
            .push(("project".to_string(), project.key.clone(), None));
        Ok(CreatedProject {
            id: "1".to_string(),
            key: project.key,
            name: project.name,
            self_link: String::new(),
        })
    }

    async fn create_issue(&self, issue: NewIssue) -> Result<CreatedIssue, TrackerError> {
        let mut log = self.log.lock().unwrap();
        let kind = match issue.kind {
            IssueKind::Epic => "epic",
            IssueKind::Story => "story",
            IssueKind::Subtask => "subtask",
        };
        log.push((kind.to_string(), issue.summary, issue.parent_key));
        let key = format!("{}-{}", issue.project_key, log.len() - 1);
        Ok(CreatedIssue {
            id: key.clone(),
            key,
            self_link: String::new(),
        })
    }
}

fn new_session(llm: Arc<ScriptedLlm>, transcript_path: Option<std::path::PathBuf>) -> Session {
    let settings = SessionSettings {
        transcript_path,
        ..SessionSettings::from(&Config::default())
    };
    Session::new(llm, Arc::new(PromptLoader::embedded_only()), settings)
}

const PLAN_JSON: &str = r#"{
    "key": "ALP",
    "name": "Acme Launch Pad",
    "description": "Launch scheduling",
    "epics": [
        {"name": "Engines", "description": "", "stories": [
            {"name": "Ignition", "description": "", "subtasks": [{"name": "Wire igniter", "description": ""}]}
        ]},
        {"name": "Telemetry", "description": "", "stories": []}
    ]
}"#;

// =============================================================================
// Full interview → tracker flow
// =============================================================================

#[tokio::test]
async fn test_interview_to_tracker() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let transcript_path = temp_dir.path().join("project_requirements.md");
    let completion = format!("{} I have what I need.", COMPLETION_PHRASE);
    let llm = ScriptedLlm::new(&["Who will use it?", &completion, PLAN_JSON]);
    let mut session = new_session(llm.clone(), Some(transcript_path.clone()));

    let first = session.submit_turn("A launch pad scheduler").await.unwrap();
    assert!(!first.is_complete);
    let second = session.submit_turn("Mission controllers").await.unwrap();
    assert!(second.is_complete);

    let tracker = RecordingTracker::default();
    let project = session.run_pipeline(&tracker).await.unwrap();
    assert_eq!(project.key, "ALP");

    assert_eq!(
        tracker.log(),
        vec![
            ("project".to_string(), "ALP".to_string(), None),
            ("epic".to_string(), "Engines".to_string(), None),
            ("story".to_string(), "Ignition".to_string(), Some("ALP-1".to_string())),
            ("subtask".to_string(), "Wire igniter".to_string(), Some("ALP-2".to_string())),
            ("epic".to_string(), "Telemetry".to_string(), None),
        ]
    );

    // The extraction request carries the persisted transcript as its user prompt
    let transcript = std::fs::read_to_string(&transcript_path).unwrap();
    let requests = llm.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[2].user_prompt.as_deref(), Some(transcript.as_str()));
    assert!(transcript.starts_with("# Project Requirements\n\n## User Input\nA launch pad scheduler\n\n"));
}

#[tokio::test]
async fn test_fallback_plan_from_transcript_headings() {
    let llm = ScriptedLlm::new(&["Noted.", "I cannot produce JSON right now."]);
    let mut session = new_session(llm, None);
    session.submit_turn("Build a scheduler").await.unwrap();

    let tracker = RecordingTracker::default();
    let project = session.run_pipeline(&tracker).await.unwrap();

    // "# Project Requirements" names the project; each turn heading is an epic
    assert_eq!(project.key, "PR");
    let log = tracker.log();
    assert_eq!(log.len(), 3);
    assert_eq!(log[1], ("epic".to_string(), "User Input".to_string(), None));
    assert_eq!(log[2], ("epic".to_string(), "AI Response".to_string(), None));
}

#[tokio::test]
async fn test_api_converse_and_transcript() {
    let llm = ScriptedLlm::new(&["What is the deadline?"]);
    let mut session = new_session(llm, None);

    let response = api::converse(
        &mut session,
        ConverseRequest {
            message: "We need a CRM".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(response.response, "What is the deadline?");
    assert!(!response.is_complete);

    let transcript = api::generate_transcript(&session).unwrap();
    assert_eq!(
        transcript.markdown,
        "# Project Requirements\n\n## User Input\nWe need a CRM\n\n## AI Response\nWhat is the deadline?\n\n"
    );
}

#[tokio::test]
async fn test_empty_model_response_leaves_user_turn() {
    let llm = ScriptedLlm::new(&[]);
    let mut session = new_session(llm, None);

    let err = session.submit_turn("Hello").await.unwrap_err();
    assert!(matches!(err, PipelineError::UpstreamEmptyResponse { .. }));
    assert_eq!(session.conversation().len(), 1);
}
