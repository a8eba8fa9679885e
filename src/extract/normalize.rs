//! Transcript text normalization.

use std::sync::LazyLock;

use regex::Regex;

use super::vocabulary::compile;

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| compile(r"[^\w\s.,!?;:()\-]"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s+"));

/// Canonicalize raw transcript text.
///
/// Drops characters outside word characters, whitespace and `.,!?;:()-`,
/// collapses every whitespace run to one space, and trims. Removal runs
/// before collapsing so a dropped symbol between two spaces cannot leave a
/// double space behind.
pub fn normalize(raw: &str) -> String {
    let kept = DISALLOWED.replace_all(raw, "");
    let collapsed = WHITESPACE.replace_all(&kept, " ");
    collapsed.trim().to_string()
}
