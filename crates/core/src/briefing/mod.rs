//! Deterministic parts of prep-brief generation.
//!
//! - `fallback` builds a complete brief from booking fields with fixed
//!   templates, no I/O and no randomness.
//! - `parse` turns a raw AI completion into brief sections, tolerating code
//!   fences, list-typed fields and non-JSON prose.
//!
//! The AI call itself lives in the agent crate; this module never talks to
//! the network.

pub mod fallback;
pub mod parse;

pub use fallback::compose_fallback;
pub use parse::{parse_completion, BriefPayload, FieldText, ParseFailure};

pub const BULLET: &str = "• ";
pub const NO_PAIN_POINTS: &str = "No pain points identified";
pub const NO_SPECIFIC_PAIN_POINTS: &str = "No specific pain points identified";

/// One item per line, each prefixed with [`BULLET`].
pub fn render_bullets<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| format!("{BULLET}{}", item.as_ref().trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn pain_points_or_placeholder(pain_points: &str, placeholder: &str) -> String {
    if pain_points.trim().is_empty() {
        placeholder.to_string()
    } else {
        pain_points.to_string()
    }
}
