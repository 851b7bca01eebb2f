//! Jira REST client
//!
//! Configuration comes from the `tracker` config section; credentials are
//! read from the environment variables it names.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::{CreatedIssue, CreatedProject, IssueKind, NewIssue, NewProject, Tracker, TrackerError};
use crate::config::{IssueTypeNames, TrackerConfig};

/// HTTP client for the Jira REST API
#[derive(Debug, Clone)]
pub struct JiraClient {
    base_url: String,
    api_version: String,
    username: String,
    api_token: String,
    project_type_key: String,
    lead_account_id: Option<String>,
    issue_types: IssueTypeNames,
    http: Client,
}

impl JiraClient {
    /// Create a client from configuration and environment credentials
    pub fn from_config(config: &TrackerConfig) -> Result<Self, TrackerError> {
        debug!(base_url = %config.base_url, "JiraClient::from_config: called");
        let env = |var: &str| {
            std::env::var(var).map_err(|_| TrackerError::Config(format!("{} is not set", var)))
        };

        let mut builder = Client::builder();
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            username: env(&config.username_env)?,
            api_token: env(&config.api_token_env)?,
            project_type_key: config.project_type_key.clone(),
            lead_account_id: config.lead_account_id.clone(),
            issue_types: config.issue_types.clone(),
            http: builder.build()?,
        })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/rest/api/{}/{}", self.base_url, self.api_version, resource)
    }

    fn issue_type_name(&self, kind: IssueKind) -> &str {
        match kind {
            IssueKind::Epic => &self.issue_types.epic,
            IssueKind::Story => &self.issue_types.story,
            IssueKind::Subtask => &self.issue_types.subtask,
        }
    }

    fn project_body(&self, project: &NewProject) -> serde_json::Value {
        let mut body = serde_json::json!({
            "key": project.key,
            "name": project.name,
            "projectTypeKey": self.project_type_key,
            "description": project.description,
        });
        if let Some(lead) = &self.lead_account_id {
            body["leadAccountId"] = serde_json::json!(lead);
        }
        body
    }

    fn issue_body(&self, issue: &NewIssue) -> serde_json::Value {
        let mut fields = serde_json::json!({
            "project": { "key": issue.project_key },
            "summary": issue.summary,
            "description": issue.description,
            "issuetype": { "name": self.issue_type_name(issue.kind) },
        });
        if let Some(parent) = &issue.parent_key {
            fields["parent"] = serde_json::json!({ "key": parent });
        }
        serde_json::json!({ "fields": fields })
    }

    async fn post<T: DeserializeOwned>(&self, resource: &str, body: &serde_json::Value) -> Result<T, TrackerError> {
        let response = self
            .http
            .post(self.url(resource))
            .basic_auth(&self.username, Some(&self.api_token))
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Handle response, converting HTTP errors to TrackerError
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, TrackerError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| TrackerError::InvalidResponse(e.to_string()));
        }
        let message = response.text().await.unwrap_or_default();
        debug!(%status, %message, "JiraClient::handle_response: error status");
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(TrackerError::Unauthorized),
            _ => Err(TrackerError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

#[async_trait]
impl Tracker for JiraClient {
    async fn create_project(&self, project: NewProject) -> Result<CreatedProject, TrackerError> {
        debug!(key = %project.key, "JiraClient::create_project: called");
        let created: JiraCreated = self.post("project", &self.project_body(&project)).await?;
        info!(key = %created.key, "Created tracker project");
        Ok(CreatedProject {
            id: created.id.into_string(),
            key: created.key,
            name: project.name,
            self_link: created.self_link,
        })
    }

    async fn create_issue(&self, issue: NewIssue) -> Result<CreatedIssue, TrackerError> {
        debug!(kind = ?issue.kind, summary = %issue.summary, "JiraClient::create_issue: called");
        let created: JiraCreated = self.post("issue", &self.issue_body(&issue)).await?;
        Ok(CreatedIssue {
            id: created.id.into_string(),
            key: created.key,
            self_link: created.self_link,
        })
    }
}

/// Create response shared by the project and issue endpoints
#[derive(Debug, Deserialize)]
struct JiraCreated {
    id: JiraId,
    key: String,
    #[serde(rename = "self", default)]
    self_link: String,
}

/// Projects report numeric ids, issues report string ids
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JiraId {
    Number(u64),
    Text(String),
}

impl JiraId {
    fn into_string(self) -> String {
        match self {
            JiraId::Number(n) => n.to_string(),
            JiraId::Text(s) => s,
        }
    }
}
