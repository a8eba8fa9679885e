//! Core orchestration logic.
//!
//! This module contains:
//! - Orchestrator: runs the extraction pipeline for one link
//! - RecipeStore: durable keyed storage of finished records
//! - EventStore: append-only per-run event log
//! - PipelineError: failure taxonomy and caller classification

pub mod error;
pub mod event_store;
pub mod orchestrator;
pub mod store;

// Re-export commonly used types
pub use error::{ErrorClass, PipelineError, Stage};
pub use event_store::EventStore;
pub use orchestrator::{Orchestrator, TranscribeRequest};
pub use store::{MemoryRecipeStore, RecipeStore, SqliteRecipeStore};
