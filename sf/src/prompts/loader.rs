//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::embedded;

/// Errors from loading or rendering a template
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt template not found: {0}")]
    NotFound(String),

    #[error("Failed to read prompt {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render template {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: handlebars::RenderError,
    },
}

/// Named values substituted into a template
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PromptContext {
    values: BTreeMap<String, String>,
}

impl PromptContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a placeholder value
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Set a placeholder only when a value is present
    pub fn set_opt(self, name: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.set(name, v),
            None => self,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.storyforge/prompts/`)
    user_dir: Option<PathBuf>,
    /// Configured prompts directory
    extra_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a new prompt loader rooted at `workdir`
    ///
    /// # Arguments
    /// * `workdir` - Directory containing `.storyforge/prompts/`
    /// * `extra_dir` - Optional configured prompts directory
    pub fn new(workdir: impl AsRef<Path>, extra_dir: Option<PathBuf>) -> Self {
        let workdir = workdir.as_ref();
        debug!(?workdir, ?extra_dir, "PromptLoader::new: called");
        let user_dir = workdir.join(".storyforge/prompts");

        Self {
            hbs: Self::engine(),
            user_dir: user_dir.exists().then_some(user_dir),
            extra_dir: extra_dir.filter(|d| d.exists()),
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
            extra_dir: None,
        }
    }

    // Prompts carry plain text, not HTML
    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `.storyforge/prompts/{name}.pmt`
    /// 2. Configured directory: `{prompts-dir}/{name}.pmt`
    /// 3. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String, PromptError> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in [&self.user_dir, &self.extra_dir].into_iter().flatten() {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path).map_err(|source| PromptError::Read { path, source });
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(PromptError::NotFound(name.to_string()))
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &PromptContext) -> Result<String, PromptError> {
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);

        self.hbs
            .render_template(&template, context)
            .map_err(|source| PromptError::Render {
                name: template_name.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_placeholders() {
        let loader = PromptLoader::embedded_only();
        let ctx = PromptContext::new().set("max_key_len", "4");
        let rendered = loader.render("extract", &ctx).unwrap();
        assert!(rendered.contains("at most 4 uppercase letters"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn test_render_does_not_html_escape() {
        let loader = PromptLoader::embedded_only();
        let ctx = PromptContext::new()
            .set("completion_phrase", "Done & dusted.")
            .set("custom_instruction", "Ask about \"mobile\" <apps>");
        let rendered = loader.render("interview", &ctx).unwrap();
        assert!(rendered.contains("'Done & dusted.'"));
        assert!(rendered.contains("Ask about \"mobile\" <apps>"));
    }

    #[test]
    fn test_optional_section_omitted() {
        let loader = PromptLoader::embedded_only();
        let ctx = PromptContext::new()
            .set("completion_phrase", "bye")
            .set_opt("custom_instruction", None);
        assert!(ctx.get("custom_instruction").is_none());
        let rendered = loader.render("interview", &ctx).unwrap();
        assert!(rendered.contains("'bye'"));
    }

    #[test]
    fn test_user_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let prompts = dir.path().join(".storyforge/prompts");
        std::fs::create_dir_all(&prompts).unwrap();
        std::fs::write(prompts.join("extract.pmt"), "custom {{max_key_len}}").unwrap();

        let loader = PromptLoader::new(dir.path(), None);
        let rendered = loader
            .render("extract", &PromptContext::new().set("max_key_len", "4"))
            .unwrap();
        assert_eq!(rendered, "custom 4");
    }

    #[test]
    fn test_extra_dir_used_when_no_user_override() {
        let dir = tempfile::tempdir().unwrap();
        let extra = dir.path().join("prompts");
        std::fs::create_dir_all(&extra).unwrap();
        std::fs::write(extra.join("interview.pmt"), "say {{completion_phrase}}").unwrap();

        let loader = PromptLoader::new(dir.path(), Some(extra));
        let rendered = loader
            .render("interview", &PromptContext::new().set("completion_phrase", "done"))
            .unwrap();
        assert_eq!(rendered, "say done");
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(matches!(
            loader.render("nonexistent-template", &PromptContext::new()),
            Err(PromptError::NotFound(_))
        ));
    }
}
