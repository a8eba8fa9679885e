//! Declared vocabulary for transcript matching.
//!
//! Every matcher in [`crate::extract`] is compiled from these tables, so
//! the words the extractors recognize can be read (and tested) in one place.

use regex::Regex;

use crate::domain::Category;

/// Measurement unit tokens accepted after a leading quantity.
///
/// Volume: cups, tablespoons, teaspoons, milliliters, liters.
/// Mass: pounds, ounces, grams, kilograms.
pub const UNIT_TOKENS: &[&str] = &[
    "cup",
    "cups",
    "tablespoon",
    "tablespoons",
    "tbsp",
    "teaspoon",
    "teaspoons",
    "tsp",
    "pound",
    "pounds",
    "lb",
    "lbs",
    "ounce",
    "ounces",
    "oz",
    "gram",
    "grams",
    "g",
    "kilogram",
    "kilograms",
    "kg",
    "ml",
    "milliliter",
    "milliliters",
    "liter",
    "liters",
    "l",
];

/// Ordinal words that open a step
pub const ORDINAL_WORDS: &[&str] = &[
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth",
    "tenth",
];

/// Keyword buckets in priority order; the first bucket with a hit wins
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Pantry, &["flour", "sugar", "salt", "pepper"]),
    (Category::MeatAndSeafood, &["chicken", "beef", "pork", "fish"]),
    (Category::Vegetables, &["onion", "garlic", "tomato", "carrot"]),
    (Category::DairyAndEggs, &["milk", "cheese", "butter", "egg"]),
    (Category::CondimentsAndOils, &["oil", "vinegar", "sauce"]),
];

/// Duration unit tokens and their length in seconds
pub const DURATION_UNITS: &[(&str, u64)] = &[
    ("minute", 60),
    ("minutes", 60),
    ("min", 60),
    ("mins", 60),
    ("hour", 3600),
    ("hours", 3600),
    ("hr", 3600),
    ("hrs", 3600),
    ("second", 1),
    ("seconds", 1),
    ("sec", 1),
    ("secs", 1),
];

/// Seconds per unit for a matched duration token (case-insensitive)
pub fn duration_multiplier(token: &str) -> Option<u64> {
    let lower = token.to_lowercase();
    DURATION_UNITS
        .iter()
        .find(|(unit, _)| *unit == lower)
        .map(|(_, seconds)| *seconds)
}

/// Build a regex alternation from a token table, longest tokens first
pub fn alternation<'a>(tokens: impl IntoIterator<Item = &'a str>) -> String {
    let mut tokens: Vec<&str> = tokens.into_iter().collect();
    tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    tokens
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|")
}

/// Compile a pattern assembled from the tables above.
///
/// The tables are constants, so a failure here is a programming error
/// caught by the unit tests.
pub(crate) fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid vocabulary pattern {pattern}: {e}"))
}
