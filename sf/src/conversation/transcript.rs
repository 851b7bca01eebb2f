//! Markdown transcript rendering

use std::path::Path;

use tracing::{debug, info};

use super::Conversation;
use crate::llm::Role;

/// Title line of every transcript
pub const TRANSCRIPT_TITLE: &str = "Project Requirements";

fn heading(role: Role) -> &'static str {
    match role {
        Role::User => "User Input",
        Role::Assistant => "AI Response",
    }
}

/// Render a conversation as a markdown document
///
/// One `##` block per turn, content included verbatim.
pub fn format_transcript(conversation: &Conversation) -> String {
    debug!(turn_count = conversation.len(), "format_transcript: called");
    let mut md = format!("# {}\n\n", TRANSCRIPT_TITLE);

    for turn in conversation.turns() {
        md.push_str(&format!("## {}\n{}\n\n", heading(turn.role()), turn.content()));
    }

    md
}

/// Persist a rendered transcript, replacing any previous file
pub fn write_transcript(path: &Path, markdown: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, markdown)?;
    info!(path = %path.display(), bytes = markdown.len(), "Transcript written");
    Ok(())
}
