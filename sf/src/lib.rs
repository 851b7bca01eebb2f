//! StoryForge - conversation to issue-tracker project pipeline
//!
//! StoryForge interviews a user about a software project through a chat
//! model, renders the dialogue as a markdown transcript, extracts a
//! project → epics → stories → subtasks plan from it and creates that
//! hierarchy in an issue tracker.
//!
//! # Pipeline
//!
//! ```text
//! Session (Conversation) → format_transcript → PlanExtractor → Materializer → Tracker
//!                                                  ↓ (bad JSON)
//!                                            parse_markdown
//! ```
//!
//! # Modules
//!
//! - [`conversation`] - Turn log, completion detection, transcript rendering
//! - [`session`] - One interview session and its pipeline stages
//! - [`plan`] - Plan model, model-backed extractor, heading fallback parser
//! - [`materialize`] - Creates a plan's hierarchy in a tracker
//! - [`tracker`] - Tracker trait, Jira client, dry-run recorder
//! - [`llm`] - Completion model client trait and OpenAI/Azure implementation
//! - [`prompts`] - Handlebars prompt templates
//! - [`api`] - Serde request/response surface over a session
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod api;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod materialize;
pub mod plan;
pub mod prompts;
pub mod session;
pub mod tracker;

pub use config::Config;
pub use conversation::{COMPLETION_PHRASE, Conversation, format_transcript, is_complete};
pub use error::{CreationStep, PipelineError, Stage};
pub use llm::{LlmClient, LlmError};
pub use materialize::Materializer;
pub use plan::{Extraction, PlanExtractor, PlanSource, ProjectPlan, parse_markdown};
pub use prompts::PromptLoader;
pub use session::{Session, SessionSettings, TurnReply};
pub use tracker::{DryRunTracker, JiraClient, Tracker, TrackerError};
