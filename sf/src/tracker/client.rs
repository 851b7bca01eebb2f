//! Tracker trait definition

use async_trait::async_trait;

use super::{CreatedIssue, CreatedProject, NewIssue, NewProject, TrackerError};

/// Hierarchical issue creation service
///
/// Each call either succeeds or fails on its own; there is no batching and no
/// rollback.
#[async_trait]
pub trait Tracker: Send + Sync {
    async fn create_project(&self, project: NewProject) -> Result<CreatedProject, TrackerError>;

    async fn create_issue(&self, issue: NewIssue) -> Result<CreatedIssue, TrackerError>;
}
