//! Plan extraction - transcript to project hierarchy
//!
//! # Architecture
//!
//! ```text
//! Transcript → PlanExtractor → LLM (plan JSON) → ProjectPlan
//!                   ↓ (malformed or invalid JSON)
//!             parse_markdown(transcript) → ProjectPlan
//! ```

mod extractor;
mod fallback;
mod model;

pub use extractor::{Extraction, PlanExtractor, PlanSource};
pub use fallback::parse_markdown;
pub use model::{Epic, MAX_KEY_LEN, PlanParseError, ProjectPlan, Story, Subtask, derive_key};
