//! Ingredient extraction from normalized transcript text.

use std::sync::LazyLock;

use regex::Regex;

use super::vocabulary::{alternation, compile, CATEGORY_KEYWORDS, UNIT_TOKENS};
use crate::domain::{Category, IngredientEntry};

/// Maximum number of ingredients kept per recipe
pub const MAX_INGREDIENTS: usize = 20;

/// Lines shorter than this (after trimming) are ignored
const MIN_LINE_CHARS: usize = 3;

/// Bare-name lines must be shorter than this
const MAX_BARE_NAME_CHARS: usize = 50;

/// Substrings that mark a line as instructions rather than an ingredient
const BARE_NAME_EXCLUSIONS: &[&str] = &["step", "instruction"];

static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)^([0-9]+(?:\.[0-9]+)?)\s*({})\s+(.+)$",
        alternation(UNIT_TOKENS.iter().copied())
    ))
});

/// A "<qty> <unit> <name>" match
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityMatch<'a> {
    pub qty: f64,
    /// Lower-cased unit token
    pub unit: String,
    /// Remainder of the line, trimmed
    pub name: &'a str,
}

/// Match a leading quantity and unit, e.g. "2 cups flour" or "250g butter".
///
/// A zero quantity is not a measurement; such lines fall through to the
/// bare-name matcher.
pub fn match_quantity(line: &str) -> Option<QuantityMatch<'_>> {
    let caps = QUANTITY.captures(line)?;
    let qty: f64 = caps.get(1)?.as_str().parse().ok()?;
    if qty <= 0.0 {
        return None;
    }
    let unit = caps.get(2)?.as_str().to_lowercase();
    let name = caps.get(3)?.as_str().trim();

    Some(QuantityMatch { qty, unit, name })
}

/// Accept a whole short line as an ingredient name.
///
/// The exclusion check is case-sensitive: "Step" does not exclude a line.
pub fn match_bare_name(line: &str) -> Option<&str> {
    if line.chars().count() >= MAX_BARE_NAME_CHARS {
        return None;
    }
    if BARE_NAME_EXCLUSIONS.iter().any(|word| line.contains(word)) {
        return None;
    }
    Some(line)
}

/// Classify an ingredient name into a grocery category.
///
/// Case-insensitive substring match against the keyword buckets, in
/// priority order. Returns [`Category::Other`] when nothing matches.
pub fn categorize_ingredient(name: &str) -> Category {
    let lower = name.to_lowercase();

    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// Extract up to [`MAX_INGREDIENTS`] ingredients, in line order.
///
/// Each line is tried against the quantity matcher, then the bare-name
/// matcher; lines matching neither contribute nothing. Later lines are not
/// looked at once the cap is reached.
pub fn extract_ingredients(text: &str) -> Vec<IngredientEntry> {
    let mut ingredients = Vec::new();

    for line in text.lines() {
        if ingredients.len() >= MAX_INGREDIENTS {
            break;
        }

        let line = line.trim();
        if line.chars().count() < MIN_LINE_CHARS {
            continue;
        }

        if let Some(m) = match_quantity(line) {
            ingredients.push(IngredientEntry::measured(m.name, m.qty, m.unit));
        } else if let Some(name) = match_bare_name(line) {
            ingredients.push(IngredientEntry::bare(name));
        }
    }

    ingredients
}
