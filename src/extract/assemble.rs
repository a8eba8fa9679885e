//! Recipe assembly: title and creator heuristics plus the extractors.

use url::Url;

use super::ingredients::extract_ingredients;
use super::steps::extract_steps;
use crate::domain::{IngredientEntry, RecipeId, RecipeRecord, RecipeText, StepEntry};

/// Creator label for YouTube links (the channel is not resolved)
pub const YOUTUBE_CREATOR: &str = "YouTube Creator";

/// Creator label for TikTok links (the account is not resolved)
pub const TIKTOK_CREATOR: &str = "TikTok Creator";

/// Creator label for links that do not parse as URLs
pub const UNKNOWN_CREATOR: &str = "Unknown Creator";

/// First non-blank line of the text, trimmed
pub fn derive_title(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Coarse creator handle from the link's host
pub fn derive_creator(source_link: &str) -> String {
    let host = match Url::parse(source_link) {
        Ok(url) => url.host_str().map(str::to_string),
        Err(_) => None,
    };

    match host {
        Some(host) if host.contains("youtube.com") || host.contains("youtu.be") => {
            YOUTUBE_CREATOR.to_string()
        }
        Some(host) if host.contains("tiktok.com") => TIKTOK_CREATOR.to_string(),
        Some(host) if !host.is_empty() => host,
        _ => UNKNOWN_CREATOR.to_string(),
    }
}

/// Build the recipe record for a normalized transcript
pub fn assemble(
    recipe_id: RecipeId,
    source_link: &str,
    language: &str,
    normalized_text: &str,
) -> RecipeRecord {
    build_record(
        recipe_id,
        source_link,
        language,
        normalized_text,
        extract_ingredients(normalized_text),
        extract_steps(normalized_text),
    )
}

/// Combine already-extracted entries into a record
pub fn build_record(
    recipe_id: RecipeId,
    source_link: &str,
    language: &str,
    normalized_text: &str,
    ingredients: Vec<IngredientEntry>,
    steps: Vec<StepEntry>,
) -> RecipeRecord {
    RecipeRecord {
        recipe_id,
        title: derive_title(normalized_text),
        creator_handle: Some(derive_creator(source_link)),
        source_link: source_link.to_string(),
        lang: language.to_string(),
        text: RecipeText::original(normalized_text),
        ingredients,
        steps,
    }
}
