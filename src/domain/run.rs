//! Pipeline run state and reconstruction from events.
//!
//! A Run is one attempt to turn a source link into a recipe record. Its
//! state machine only moves forward; the cache-hit branch is the only
//! legal shortcut.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::events::{Event, EventType};
use super::recipe::RecipeId;

/// Stages of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    IdentityComputed,
    CacheChecked,
    /// Terminal: the stored record was returned
    CacheHit,
    AudioFetched,
    ConvertedToWav,
    Transcribed,
    Normalized,
    Extracted,
    Assembled,
    /// Terminal: a fresh record was stored
    Persisted,
    /// Terminal: some stage failed
    Failed,
}

impl PipelineState {
    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineState::CacheHit | PipelineState::Persisted | PipelineState::Failed
        )
    }

    /// Whether `next` directly follows `self`
    pub fn can_advance_to(self, next: PipelineState) -> bool {
        use PipelineState::*;

        if next == Failed {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Idle, IdentityComputed)
                | (IdentityComputed, CacheChecked)
                | (CacheChecked, CacheHit)
                | (CacheChecked, AudioFetched)
                | (AudioFetched, ConvertedToWav)
                | (ConvertedToWav, Transcribed)
                | (Transcribed, Normalized)
                | (Normalized, Extracted)
                | (Extracted, Assembled)
                | (Assembled, Persisted)
        )
    }
}

/// Rejected state machine move
#[derive(Debug, Clone, Error)]
#[error("Invalid run transition: {from:?} → {to:?}")]
pub struct InvalidTransition {
    pub from: PipelineState,
    pub to: PipelineState,
}

/// A single pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Unique identifier for this run
    pub id: Uuid,

    /// Link submitted for processing
    pub source_link: String,

    /// Set once the identity stage has run
    pub recipe_id: Option<RecipeId>,

    /// Current state
    pub state: PipelineState,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,

    /// Failure detail, if the run failed
    pub error: Option<String>,

    /// States passed through, in order
    pub history: Vec<PipelineState>,
}

impl Run {
    /// Create a new idle run
    pub fn new(id: Uuid, source_link: impl Into<String>) -> Self {
        Self {
            id,
            source_link: source_link.into(),
            recipe_id: None,
            state: PipelineState::Idle,
            started_at: Utc::now(),
            completed_at: None,
            error: None,
            history: vec![PipelineState::Idle],
        }
    }

    /// Move to the next state, refusing anything out of order
    pub fn advance(&mut self, next: PipelineState) -> Result<(), InvalidTransition> {
        if !self.state.can_advance_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        self.state = next;
        self.history.push(next);
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Mark the run failed. A no-op once the run is already terminal.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.state.is_terminal() {
            return;
        }
        self.error = Some(error.into());
        self.state = PipelineState::Failed;
        self.history.push(PipelineState::Failed);
        self.completed_at = Some(Utc::now());
    }

    /// Reconstruct run state from its event log
    pub fn from_events(events: &[Event]) -> Option<Self> {
        let first = events.first()?;

        let mut run = Self {
            id: first.run_id,
            source_link: String::new(),
            recipe_id: None,
            state: PipelineState::Idle,
            started_at: first.timestamp,
            completed_at: None,
            error: None,
            history: Vec::new(),
        };

        for event in events {
            run.apply_event(event);
        }

        Some(run)
    }

    /// Apply a single event to update run state
    pub fn apply_event(&mut self, event: &Event) {
        if let Some(ref link) = event.source_link {
            self.source_link = link.clone();
        }
        if let Some(ref recipe_id) = event.recipe_id {
            self.recipe_id = Some(recipe_id.clone());
        }

        if event.event_type == EventType::RunStarted {
            self.started_at = event.timestamp;
        }
        if event.event_type == EventType::RunFailed {
            self.error = event.error.clone();
        }

        self.state = event.state;
        if self.history.last() != Some(&event.state) {
            self.history.push(event.state);
        }
        if event.state.is_terminal() {
            self.completed_at = Some(event.timestamp);
        }
    }

    /// Check if the run is still in progress
    pub fn is_running(&self) -> bool {
        !self.state.is_terminal()
    }

    /// Check if the run produced or returned a record
    pub fn succeeded(&self) -> bool {
        matches!(self.state, PipelineState::CacheHit | PipelineState::Persisted)
    }
}
