//! Project plan hierarchy: project -> epics -> stories -> subtasks

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Longest project key the pipeline will hand to the tracker
pub const MAX_KEY_LEN: usize = 4;

/// Why a model response could not be used as a plan
///
/// Never leaves the extractor: it triggers the fallback parser instead.
#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error("response is not valid plan JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plan failed validation: {0}")]
    Schema(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Subtask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Story {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epic {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stories: Vec<Story>,
}

impl Epic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// The hierarchy handed to the materializer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPlan {
    #[serde(default)]
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub epics: Vec<Epic>,
}

impl ProjectPlan {
    /// Parse and validate a model response
    ///
    /// Field names and nesting must match the plan shape, every entity needs a
    /// non-blank name, and the project key is normalized via [`ProjectPlan::ensure_key`].
    pub fn from_json(content: &str) -> Result<Self, PlanParseError> {
        debug!(content_len = content.len(), "ProjectPlan::from_json: called");
        let mut plan: ProjectPlan = serde_json::from_str(content.trim())?;
        plan.validate()?;
        plan.ensure_key();
        Ok(plan)
    }

    fn validate(&self) -> Result<(), PlanParseError> {
        if self.name.trim().is_empty() {
            return Err(PlanParseError::Schema("project name is empty".to_string()));
        }
        for (ei, epic) in self.epics.iter().enumerate() {
            if epic.name.trim().is_empty() {
                return Err(PlanParseError::Schema(format!("epic {} has no name", ei)));
            }
            for (si, story) in epic.stories.iter().enumerate() {
                if story.name.trim().is_empty() {
                    return Err(PlanParseError::Schema(format!("story {}.{} has no name", ei, si)));
                }
                if let Some(ti) = story.subtasks.iter().position(|t| t.name.trim().is_empty()) {
                    return Err(PlanParseError::Schema(format!("subtask {}.{}.{} has no name", ei, si, ti)));
                }
            }
        }
        Ok(())
    }

    /// Fill in the project key from the name when missing or unusable
    ///
    /// A supplied key is kept when it is 1 to [`MAX_KEY_LEN`] ASCII
    /// alphanumerics; it is upper-cased.
    pub fn ensure_key(&mut self) {
        let supplied = self.key.trim();
        let usable = !supplied.is_empty()
            && supplied.chars().count() <= MAX_KEY_LEN
            && supplied.chars().all(|c| c.is_ascii_alphanumeric());

        if usable {
            self.key = supplied.to_ascii_uppercase();
            return;
        }
        if !supplied.is_empty() {
            warn!(key = %supplied, "Supplied project key unusable, deriving from name");
        }
        self.key = derive_key(&self.name);
        debug!(key = %self.key, "ProjectPlan::ensure_key: derived");
    }

    /// Total number of tracker issues this plan creates, excluding the project
    pub fn issue_count(&self) -> usize {
        self.epics
            .iter()
            .map(|e| 1 + e.stories.iter().map(|s| 1 + s.subtasks.len()).sum::<usize>())
            .sum()
    }
}

/// Derive a project key from a project name
///
/// First character of each whitespace-separated word, upper-cased, capped at
/// [`MAX_KEY_LEN`] characters.
pub fn derive_key(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(MAX_KEY_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key() {
        assert_eq!(derive_key("Acme Launch Pad"), "ALP");
        assert_eq!(derive_key("x"), "X");
        assert_eq!(derive_key("one two three four five"), "OTTF");
        assert_eq!(derive_key("  spaced   out  "), "SO");
        assert_eq!(derive_key(""), "");
    }

    #[test]
    fn test_from_json_full_plan() {
        let json = r#"{
            "key": "alp",
            "name": "Acme Launch Pad",
            "description": "Rocket tooling",
            "epics": [{
                "name": "Engines",
                "description": "Propulsion",
                "stories": [{
                    "name": "Ignition",
                    "description": "Start sequence",
                    "subtasks": [{"name": "Wire igniter", "description": "Hook up"}]
                }]
            }]
        }"#;

        let plan = ProjectPlan::from_json(json).unwrap();
        assert_eq!(plan.key, "ALP");
        assert_eq!(plan.epics[0].stories[0].subtasks[0].name, "Wire igniter");
        assert_eq!(plan.issue_count(), 3);
    }

    #[test]
    fn test_from_json_missing_key_is_derived() {
        let plan = ProjectPlan::from_json(r#"{"name": "Acme Launch Pad", "epics": []}"#).unwrap();
        assert_eq!(plan.key, "ALP");
        assert_eq!(plan.description, "");
    }

    #[test]
    fn test_from_json_long_key_is_replaced() {
        let plan = ProjectPlan::from_json(r#"{"key": "ROCKETS", "name": "Acme Launch Pad", "epics": []}"#).unwrap();
        assert_eq!(plan.key, "ALP");
    }

    #[test]
    fn test_from_json_rejects_non_json() {
        assert!(matches!(
            ProjectPlan::from_json("Here is your plan:\n# Project"),
            Err(PlanParseError::Json(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_missing_epics() {
        assert!(matches!(
            ProjectPlan::from_json(r#"{"key": "A", "name": "A"}"#),
            Err(PlanParseError::Json(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_wrong_types() {
        assert!(ProjectPlan::from_json(r#"{"name": "A", "epics": "none"}"#).is_err());
        assert!(ProjectPlan::from_json(r#"{"name": "A", "epics": [{"title": "E"}]}"#).is_err());
        assert!(ProjectPlan::from_json(r#"[1, 2, 3]"#).is_err());
    }

    #[test]
    fn test_from_json_rejects_blank_names() {
        assert!(matches!(
            ProjectPlan::from_json(r#"{"name": "  ", "epics": []}"#),
            Err(PlanParseError::Schema(_))
        ));
        assert!(matches!(
            ProjectPlan::from_json(r#"{"name": "A", "epics": [{"name": "E", "stories": [{"name": ""}]}]}"#),
            Err(PlanParseError::Schema(_))
        ));
    }

    #[test]
    fn test_serializes_plan_shape() {
        let plan = ProjectPlan {
            key: "X".to_string(),
            name: "x".to_string(),
            description: String::new(),
            epics: vec![Epic::new("E")],
        };
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["epics"][0]["name"], "E");
        assert!(value["epics"][0]["stories"].as_array().unwrap().is_empty());
    }
}
