//! recipe-scribe - Turn cooking videos into structured recipes
//!
//! Takes a video link, transcribes its audio with external tools and
//! extracts a recipe record (ingredients, steps, title, creator) from the
//! transcript.
//!
//! # Architecture
//!
//! - Records are content-addressed: the recipe ID is the SHA-256 of the link
//! - A stored record short-circuits the whole pipeline
//! - Every run writes an append-only event log for later inspection
//! - Media tools sit behind traits so they can be replaced in tests
//!
//! # Modules
//!
//! - `adapters`: yt-dlp, ffmpeg and whisper integrations
//! - `core`: Orchestrator, recipe store, run log, errors
//! - `domain`: Data structures (RecipeRecord, Run, Event)
//! - `extract`: Normalization and ingredient/step extraction
//! - `config`: Configuration loading
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Transcribe a video
//! recipe-scribe transcribe https://www.tiktok.com/@chef/video/123 --caller me
//!
//! # Extract from an existing transcript
//! recipe-scribe extract --input transcript.txt
//!
//! # Check run status
//! recipe-scribe status <run-id>
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod extract;

// Re-export main types at crate root for convenience
pub use self::core::{ErrorClass, Orchestrator, PipelineError, RecipeStore, TranscribeRequest};
pub use domain::{derive_id, Category, IngredientEntry, RecipeId, RecipeRecord, Run, StepEntry};
