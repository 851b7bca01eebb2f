//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files.
//!
//! Template loading chain:
//! 1. `.storyforge/prompts/{name}.pmt` (user override)
//! 2. `{prompts-dir}/{name}.pmt` (configured directory)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{PromptContext, PromptError, PromptLoader};
