//! Prompt assembly from retrieved fragments and the previous response.
//!
//! The assembled prompt is a fixed sequence of labelled lines. Inputs that
//! are absent simply drop their line:
//!
//! ```text
//! Related past story: {history fragment}      (if present and not a repeat)
//! Previous story: {last response}             (if present and non-empty)
//! Current story inspiration: {story fragment} (if present)
//! Current query: {user query}
//! Continue the previous story using the current query, the inspiration and the past story.
//! ```

use crate::domain::Fragment;

pub const RELATED_PAST_STORY: &str = "Related past story: ";
pub const PREVIOUS_STORY: &str = "Previous story: ";
pub const STORY_INSPIRATION: &str = "Current story inspiration: ";
pub const CURRENT_QUERY: &str = "Current query: ";
pub const CONTINUE_INSTRUCTION: &str =
    "Continue the previous story using the current query, the inspiration and the past story.";

/// Build the generation prompt for one turn.
///
/// The history fragment is skipped when its text equals `last_response`, so
/// the same memory is not repeated twice in one prompt. The comparison is on
/// text content, not on the fragment record.
pub fn assemble(
    user_query: &str,
    story: Option<&Fragment>,
    history: Option<&Fragment>,
    last_response: Option<&str>,
) -> String {
    let last_response = last_response.filter(|r| !r.is_empty());
    let mut lines = Vec::with_capacity(5);

    if let Some(history) = history {
        if last_response != Some(history.text.as_str()) {
            lines.push(format!("{RELATED_PAST_STORY}{}", history.text));
        }
    }

    if let Some(previous) = last_response {
        lines.push(format!("{PREVIOUS_STORY}{previous}"));
    }

    if let Some(story) = story {
        lines.push(format!("{STORY_INSPIRATION}{}", story.text));
    }

    lines.push(format!("{CURRENT_QUERY}{user_query}"));
    lines.push(CONTINUE_INSTRUCTION.to_string());

    lines.join("\n")
}
