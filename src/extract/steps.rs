//! Step extraction from normalized transcript text.

use std::sync::LazyLock;

use regex::Regex;

use super::vocabulary::{
    alternation, compile, duration_multiplier, DURATION_UNITS, ORDINAL_WORDS,
};
use crate::domain::StepEntry;

/// Maximum number of steps kept per recipe
pub const MAX_STEPS: usize = 15;

/// Lines shorter than this (after trimming) are never steps
const MIN_LINE_CHARS: usize = 10;

/// Unmarked lines longer than this still count as steps
const FALLBACK_MIN_CHARS: usize = 20;

/// Unmarked lines containing this are treated as ingredient talk
const FALLBACK_EXCLUSION: &str = "ingredient";

static STEP_WORD: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)^step(?:\s*([0-9]+)|\b)\s*[:\-]?"));
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| compile(r"^([0-9]+)[.)]"));
static ORDINAL: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)^({})",
        alternation(ORDINAL_WORDS.iter().copied())
    ))
});
static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)([0-9]+)\s*({})",
        alternation(DURATION_UNITS.iter().map(|(unit, _)| *unit))
    ))
});

/// An explicit marker that opens a step line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepMarker {
    /// "Step 3: ..." or a bare "Step ..."
    StepWord(Option<u32>),
    /// "3. ..." or "3) ..." (None when the numeral is too large to hold)
    Numbered(Option<u32>),
    /// "First ...", "Second ...", through "Tenth ..." (1-based position)
    Ordinal(usize),
}

/// Detect a leading step marker
pub fn match_step_marker(line: &str) -> Option<StepMarker> {
    if let Some(caps) = STEP_WORD.captures(line) {
        let number = caps.get(1).and_then(|m| m.as_str().parse().ok());
        return Some(StepMarker::StepWord(number));
    }

    if let Some(caps) = NUMBERED.captures(line) {
        return Some(StepMarker::Numbered(caps[1].parse().ok()));
    }

    let caps = ORDINAL.captures(line)?;
    let word = caps[1].to_lowercase();
    ORDINAL_WORDS
        .iter()
        .position(|w| *w == word)
        .map(|i| StepMarker::Ordinal(i + 1))
}

/// Find the first usable duration expression in a line, in seconds.
///
/// "10 minutes" → 600, "2 hrs" → 7200. Expressions that overflow are
/// skipped in favour of later ones.
pub fn match_duration(line: &str) -> Option<u64> {
    DURATION.captures_iter(line).find_map(|caps| {
        let value: u64 = caps[1].parse().ok()?;
        value.checked_mul(duration_multiplier(&caps[2])?)
    })
}

/// Whether a trimmed line qualifies as a step
fn is_step_line(line: &str) -> bool {
    match_step_marker(line).is_some()
        || (line.chars().count() > FALLBACK_MIN_CHARS && !line.contains(FALLBACK_EXCLUSION))
}

/// Extract up to [`MAX_STEPS`] steps, in line order.
///
/// Indices are assigned 1, 2, 3... in emission order and ignore any
/// numeral spoken in the line itself.
pub fn extract_steps(text: &str) -> Vec<StepEntry> {
    let mut steps = Vec::new();

    for line in text.lines() {
        if steps.len() >= MAX_STEPS {
            break;
        }

        let line = line.trim();
        if line.chars().count() < MIN_LINE_CHARS || !is_step_line(line) {
            continue;
        }

        steps.push(StepEntry {
            index: steps.len() as u32 + 1,
            text: line.to_string(),
            duration_sec: match_duration(line),
            image_url: None,
            notes: None,
        });
    }

    steps
}
