//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::{LlmConfig, TrackerConfig};

/// StoryForge - turn a requirements interview into tracker issues
#[derive(Parser)]
#[command(
    name = "sf",
    about = "Interview a user about a project and create its epics, stories and subtasks",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interactive requirements interview (default)
    Chat {
        /// Create the project automatically once the interview completes
        #[arg(long)]
        create: bool,

        /// Record tracker calls instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Parse a transcript with the heading parser (offline)
    Parse {
        /// Transcript markdown file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Extract a plan from a transcript using the model
    Extract {
        /// Transcript markdown file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Extract a plan from a transcript and create it in the tracker
    Create {
        /// Transcript markdown file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Record tracker calls instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("storyforge")
        .join("logs")
        .join("storyforge.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate after_help text showing credential status and log location
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let llm = LlmConfig::default();
    let tracker = TrackerConfig::default();

    let mut help = String::new();
    help.push_str("Credentials (default variables):\n");
    for var in [&llm.api_key_env, &tracker.username_env, &tracker.api_token_env] {
        let icon = if std::env::var(var).is_ok() {
            debug!(%var, "generate_after_help: variable set");
            "\u{2705}"
        } else {
            debug!(%var, "generate_after_help: variable not set");
            "\u{274C}"
        };
        help.push_str(&format!("  {} {}\n", icon, var));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));

    debug!("generate_after_help: returning help text");
    help
}
