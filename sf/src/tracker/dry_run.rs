//! DryRunTracker - records calls instead of sending them

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::{debug, info};

use super::{CreatedIssue, CreatedProject, NewIssue, NewProject, Tracker, TrackerError};

/// One recorded tracker call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerCall {
    CreateProject(NewProject),
    CreateIssue(NewIssue),
}

/// Tracker that accepts every call and fabricates sequential keys
///
/// Issue keys follow the `<PROJECT>-<n>` convention so parent links in a
/// dry run look like the real thing.
#[derive(Debug, Default)]
pub struct DryRunTracker {
    calls: Mutex<Vec<TrackerCall>>,
    next_issue: AtomicUsize,
}

impl DryRunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<TrackerCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: TrackerCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl Tracker for DryRunTracker {
    async fn create_project(&self, project: NewProject) -> Result<CreatedProject, TrackerError> {
        debug!(key = %project.key, "DryRunTracker::create_project: called");
        let created = CreatedProject {
            id: "dry-run".to_string(),
            key: project.key.clone(),
            name: project.name.clone(),
            self_link: format!("dry-run://project/{}", project.key),
        };
        info!(key = %created.key, name = %created.name, "[dry-run] create project");
        self.record(TrackerCall::CreateProject(project));
        Ok(created)
    }

    async fn create_issue(&self, issue: NewIssue) -> Result<CreatedIssue, TrackerError> {
        let n = self.next_issue.fetch_add(1, Ordering::SeqCst) + 1;
        let key = format!("{}-{}", issue.project_key, n);
        info!(
            %key,
            kind = ?issue.kind,
            parent = ?issue.parent_key,
            summary = %issue.summary,
            "[dry-run] create issue"
        );
        self.record(TrackerCall::CreateIssue(issue));
        Ok(CreatedIssue {
            id: n.to_string(),
            self_link: format!("dry-run://issue/{}", key),
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::IssueKind;

    #[tokio::test]
    async fn test_sequential_keys_and_recorded_calls() {
        let tracker = DryRunTracker::new();
        let project = tracker
            .create_project(NewProject {
                key: "ALP".to_string(),
                name: "Acme Launch Pad".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(project.key, "ALP");

        let epic = tracker
            .create_issue(NewIssue {
                project_key: "ALP".to_string(),
                summary: "Engines".to_string(),
                description: String::new(),
                kind: IssueKind::Epic,
                parent_key: None,
            })
            .await
            .unwrap();
        let story = tracker
            .create_issue(NewIssue {
                project_key: "ALP".to_string(),
                summary: "Ignition".to_string(),
                description: String::new(),
                kind: IssueKind::Story,
                parent_key: Some(epic.key.clone()),
            })
            .await
            .unwrap();

        assert_eq!(epic.key, "ALP-1");
        assert_eq!(story.key, "ALP-2");
        assert_eq!(tracker.calls().len(), 3);
        assert!(matches!(tracker.calls()[0], TrackerCall::CreateProject(_)));
    }
}
