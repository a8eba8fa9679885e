//! Run log events.
//!
//! Every state transition of a pipeline run is recorded as an immutable
//! event in an append-only log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::recipe::RecipeId;
use super::run::PipelineState;

/// A single event in a run's log.
///
/// Replaying a run's events in order reconstructs its [`Run`](super::Run).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier for this event
    pub id: Uuid,

    /// When this event occurred (ISO 8601)
    pub timestamp: DateTime<Utc>,

    /// The run this event belongs to
    pub run_id: Uuid,

    /// Type of event
    pub event_type: EventType,

    /// Run state after this event
    pub state: PipelineState,

    /// Human-readable summary
    pub payload_summary: String,

    /// Source link (run start only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_link: Option<String>,

    /// Recipe identity, once computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<RecipeId>,

    /// Time spent in the stage, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Error message if failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Event {
    /// Create a new event with the current timestamp
    pub fn new(
        run_id: Uuid,
        event_type: EventType,
        state: PipelineState,
        payload_summary: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            run_id,
            event_type,
            state,
            payload_summary: payload_summary.into(),
            source_link: None,
            recipe_id: None,
            duration_ms: None,
            error: None,
        }
    }

    pub fn with_source_link(mut self, link: impl Into<String>) -> Self {
        self.source_link = Some(link.into());
        self
    }

    pub fn with_recipe_id(mut self, recipe_id: RecipeId) -> Self {
        self.recipe_id = Some(recipe_id);
        self
    }

    /// Create an event with duration information
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Create an event with error information
    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }
}

/// Types of events that can occur during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A new run has started
    RunStarted,

    /// A pipeline stage finished and the run advanced
    StageCompleted,

    /// A stored record was found; no stages ran
    CacheHit,

    /// A fresh record was persisted
    RunCompleted,

    /// A stage failed and the run was aborted
    RunFailed,
}
