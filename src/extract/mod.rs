//! Recipe extraction from transcript text.
//!
//! Pure, synchronous functions with no I/O:
//! - `normalize`: canonical transcript text
//! - `ingredients`: quantity/unit/name matching and categorization
//! - `steps`: step markers, durations, sequence indices
//! - `assemble`: title/creator heuristics and the final record
//! - `vocabulary`: the word tables all matchers are built from

pub mod assemble;
pub mod ingredients;
pub mod normalize;
pub mod steps;
pub mod vocabulary;

pub use assemble::{
    assemble, build_record, derive_creator, derive_title, TIKTOK_CREATOR, UNKNOWN_CREATOR,
    YOUTUBE_CREATOR,
};
pub use ingredients::{
    categorize_ingredient, extract_ingredients, match_bare_name, match_quantity, QuantityMatch,
    MAX_INGREDIENTS,
};
pub use normalize::normalize;
pub use steps::{extract_steps, match_duration, match_step_marker, StepMarker, MAX_STEPS};
