//! Tracker request/response types

use serde::{Deserialize, Serialize};

/// Level of the plan hierarchy an issue represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Epic,
    Story,
    Subtask,
}

/// Project creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProject {
    pub key: String,
    pub name: String,
    pub description: String,
}

/// Issue creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub project_key: String,
    pub summary: String,
    pub description: String,
    pub kind: IssueKind,
    pub parent_key: Option<String>,
}

/// Project as reported back by the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedProject {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(rename = "self")]
    pub self_link: String,
}

/// Issue as reported back by the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
    #[serde(rename = "self")]
    pub self_link: String,
}
