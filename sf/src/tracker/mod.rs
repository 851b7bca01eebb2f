//! Issue tracker collaborator
//!
//! The pipeline only needs two operations from a tracker: create a project
//! and create an issue (optionally under a parent). `JiraClient` talks to a
//! Jira REST API; `DryRunTracker` records calls and invents keys.

pub mod client;
mod dry_run;
mod error;
mod jira;
mod types;

pub use client::Tracker;
pub use dry_run::{DryRunTracker, TrackerCall};
pub use error::TrackerError;
pub use jira::JiraClient;
pub use types::{CreatedIssue, CreatedProject, IssueKind, NewIssue, NewProject};
