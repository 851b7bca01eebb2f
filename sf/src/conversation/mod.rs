//! Conversation log and its transcript projection
//!
//! A `Conversation` is the append-only dialogue owned by one session. The
//! transcript is a pure rendering of it and can be regenerated at any time.

mod store;
mod transcript;

pub use store::{COMPLETION_PHRASE, Conversation, Turn, is_complete};
pub use transcript::{TRANSCRIPT_TITLE, format_transcript, write_transcript};
