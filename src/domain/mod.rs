//! Domain types for recipe-scribe.
//!
//! This module contains the core data structures:
//! - Recipe: The persisted recipe record and its entries
//! - Run: Pipeline run state machine
//! - Events: Immutable records of run transitions

pub mod events;
pub mod recipe;
pub mod run;

// Re-export commonly used types
pub use events::{Event, EventType};
pub use recipe::{
    derive_id, Category, IngredientEntry, RecipeId, RecipeRecord, RecipeText, StepEntry,
};
pub use run::{InvalidTransition, PipelineState, Run};
