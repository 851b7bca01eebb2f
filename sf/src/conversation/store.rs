//! Append-only dialogue log

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::{Message, Role};

/// Phrase the interviewer uses to signal it has gathered enough information
pub const COMPLETION_PHRASE: &str = "Thank you for providing all the necessary information.";

/// Check whether assistant text carries the completion signal
///
/// Case-insensitive substring match against [`COMPLETION_PHRASE`].
pub fn is_complete(text: &str) -> bool {
    text.to_lowercase().contains(&COMPLETION_PHRASE.to_lowercase())
}

/// One message in the dialogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

impl From<&Turn> for Message {
    fn from(turn: &Turn) -> Self {
        Message {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

/// Ordered log of turns
///
/// Turns can only be appended; nothing hands out mutable access to an
/// existing turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Role::User, content.into());
    }

    /// Append an assistant turn
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Role::Assistant, content.into());
    }

    fn push(&mut self, role: Role, content: String) {
        debug!(?role, content_len = content.len(), turn_index = self.turns.len(), "Conversation::push: called");
        self.turns.push(Turn { role, content });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// History in the shape the model client expects
    pub fn to_messages(&self) -> Vec<Message> {
        self.turns.iter().map(Message::from).collect()
    }
}
