//! Heading-based plan parser
//!
//! Reads heading depth as hierarchy: `#` names the project, `##` opens an
//! epic, `###` opens a story and `- ` items become subtasks of the open
//! story. Every other non-blank line extends the description of the
//! innermost open entity. Used whenever the model's plan JSON is unusable.

use tracing::debug;

use super::model::{Epic, ProjectPlan, Story, Subtask};

/// Parse a markdown document into a plan
///
/// Always succeeds; an empty document yields an empty plan with an empty key.
pub fn parse_markdown(doc: &str) -> ProjectPlan {
    debug!(doc_len = doc.len(), "parse_markdown: called");
    let mut parser = Parser::default();
    for line in doc.lines() {
        parser.line(line);
    }
    parser.finish()
}

#[derive(Default)]
struct Parser {
    project: ProjectPlan,
    epic: Option<Epic>,
    story: Option<Story>,
}

impl Parser {
    fn line(&mut self, line: &str) {
        if let Some(rest) = line.strip_prefix("# ") {
            self.project.name = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("## ") {
            self.close_epic();
            self.epic = Some(Epic::new(rest.trim()));
        } else if let Some(rest) = line.strip_prefix("### ") {
            if self.epic.is_none() {
                debug!(heading = %rest.trim(), "parse_markdown: story heading outside an epic, ignored");
                return;
            }
            self.close_story();
            self.story = Some(Story::new(rest.trim()));
        } else if let Some(rest) = line.strip_prefix("- ") {
            match self.story.as_mut() {
                Some(story) => story.subtasks.push(Subtask::new(rest.trim())),
                None => debug!("parse_markdown: list item outside a story, discarded"),
            }
        } else if !line.trim().is_empty() {
            let description = match (self.story.as_mut(), self.epic.as_mut()) {
                (Some(story), _) => &mut story.description,
                (None, Some(epic)) => &mut epic.description,
                (None, None) => &mut self.project.description,
            };
            append(description, line.trim());
        }
    }

    fn close_story(&mut self) {
        if let Some(story) = self.story.take()
            && let Some(epic) = self.epic.as_mut()
        {
            epic.stories.push(story);
        }
    }

    fn close_epic(&mut self) {
        self.close_story();
        if let Some(epic) = self.epic.take() {
            self.project.epics.push(epic);
        }
    }

    fn finish(mut self) -> ProjectPlan {
        self.close_epic();
        if self.project.key.is_empty() {
            self.project.ensure_key();
        }
        debug!(
            name = %self.project.name,
            key = %self.project.key,
            epic_count = self.project.epics.len(),
            "parse_markdown: finished"
        );
        self.project
    }
}

fn append(description: &mut String, text: &str) {
    if !description.is_empty() {
        description.push(' ');
    }
    description.push_str(text);
}
