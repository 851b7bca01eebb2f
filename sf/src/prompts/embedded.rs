//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Requirements interviewer system prompt
pub const INTERVIEW: &str = include_str!("../../prompts/interview.pmt");

/// Transcript-to-plan extraction system prompt
pub const EXTRACT: &str = include_str!("../../prompts/extract.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "interview" => Some(INTERVIEW),
        "extract" => Some(EXTRACT),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
