//! Materializer - walks a ProjectPlan and creates tracker issues
//!
//! Creation is strictly sequential, depth-first and parent-before-child:
//! every child needs the key the tracker assigned to its parent. The first
//! failure stops the walk; whatever was already created stays in place.

use tracing::{debug, info};

use crate::error::{CreationStep, PipelineError};
use crate::plan::ProjectPlan;
use crate::tracker::{CreatedProject, IssueKind, NewIssue, NewProject, Tracker, TrackerError};

/// Creates a plan's hierarchy in a tracker
pub struct Materializer<'a> {
    tracker: &'a dyn Tracker,
}

impl<'a> Materializer<'a> {
    pub fn new(tracker: &'a dyn Tracker) -> Self {
        Self { tracker }
    }

    /// Create the project and every epic, story and subtask under it
    ///
    /// Takes the plan by value: a plan is materialized at most once.
    pub async fn materialize(&self, plan: ProjectPlan) -> Result<CreatedProject, PipelineError> {
        info!(key = %plan.key, issue_count = plan.issue_count(), "Materializing project plan");

        let step = CreationStep::Project { key: plan.key.clone() };
        if plan.key.trim().is_empty() {
            return Err(PipelineError::ProjectCreationFailed {
                step,
                source: TrackerError::InvalidRequest("project key is empty".to_string()),
            });
        }

        let project = self
            .tracker
            .create_project(NewProject {
                key: plan.key.clone(),
                name: plan.name.clone(),
                description: plan.description.clone(),
            })
            .await
            .map_err(|source| PipelineError::ProjectCreationFailed { step, source })?;

        let mut created = 0usize;
        for epic in plan.epics {
            let epic_key = self
                .create(
                    &project.key,
                    IssueKind::Epic,
                    &epic.name,
                    &epic.description,
                    None,
                    CreationStep::Epic {
                        name: epic.name.clone(),
                    },
                )
                .await?;
            created += 1;

            for story in epic.stories {
                let story_key = self
                    .create(
                        &project.key,
                        IssueKind::Story,
                        &story.name,
                        &story.description,
                        Some(&epic_key),
                        CreationStep::Story {
                            name: story.name.clone(),
                            epic_key: epic_key.clone(),
                        },
                    )
                    .await?;
                created += 1;

                for subtask in story.subtasks {
                    self.create(
                        &project.key,
                        IssueKind::Subtask,
                        &subtask.name,
                        &subtask.description,
                        Some(&story_key),
                        CreationStep::Subtask {
                            name: subtask.name.clone(),
                            story_key: story_key.clone(),
                        },
                    )
                    .await?;
                    created += 1;
                }
            }
        }

        info!(key = %project.key, issues_created = created, "Project materialized");
        Ok(project)
    }

    async fn create(
        &self,
        project_key: &str,
        kind: IssueKind,
        summary: &str,
        description: &str,
        parent_key: Option<&str>,
        step: CreationStep,
    ) -> Result<String, PipelineError> {
        debug!(?kind, %summary, ?parent_key, "Materializer::create: called");
        let issue = self
            .tracker
            .create_issue(NewIssue {
                project_key: project_key.to_string(),
                summary: summary.to_string(),
                description: description.to_string(),
                kind,
                parent_key: parent_key.map(String::from),
            })
            .await
            .map_err(|source| PipelineError::ProjectCreationFailed { step, source })?;
        debug!(key = %issue.key, ?kind, "Materializer::create: created");
        Ok(issue.key)
    }
}
