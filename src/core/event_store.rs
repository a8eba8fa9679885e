//! Append-only run log with file-based persistence.
//!
//! Each run writes newline-delimited JSON (JSONL) to
//! `<runs_dir>/<run_id>/events.jsonl` for easy inspection.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use crate::domain::Event;

/// File-based event store for one run
pub struct EventStore {
    /// Directory containing the run
    run_dir: PathBuf,

    /// Path to the events.jsonl file
    events_path: PathBuf,
}

impl EventStore {
    /// Create or open the log for a run under `runs_dir`
    pub async fn open(runs_dir: &Path, run_id: Uuid) -> Result<Self> {
        let run_dir = runs_dir.join(run_id.to_string());

        fs::create_dir_all(&run_dir)
            .await
            .with_context(|| format!("Failed to create run directory: {}", run_dir.display()))?;

        let events_path = run_dir.join("events.jsonl");

        Ok(Self {
            run_dir,
            events_path,
        })
    }

    /// Open an existing run's log without creating anything
    pub fn existing(runs_dir: &Path, run_id: Uuid) -> Self {
        let run_dir = runs_dir.join(run_id.to_string());
        let events_path = run_dir.join("events.jsonl");
        Self {
            run_dir,
            events_path,
        }
    }

    /// Get the path to the events file
    pub fn events_path(&self) -> &Path {
        &self.events_path
    }

    /// Get the run directory
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Append an event to the log
    pub async fn append(&self, event: &Event) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.events_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to open events file: {}",
                    self.events_path.display()
                )
            })?;

        let json = serde_json::to_string(event).context("Failed to serialize event")?;
        file.write_all(format!("{}\n", json).as_bytes())
            .await
            .context("Failed to write event")?;
        file.flush().await.context("Failed to flush event")?;

        Ok(())
    }

    /// Replay all events in order
    pub async fn replay(&self) -> Result<Vec<Event>> {
        if !self.events_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.events_path)
            .await
            .with_context(|| format!("Failed to open events file: {}", self.events_path.display()))?;

        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut events = Vec::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let event: Event = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse event: {}", line))?;
            events.push(event);
        }

        Ok(events)
    }

    /// List all run IDs under `runs_dir`
    pub async fn list_runs(runs_dir: &Path) -> Result<Vec<Uuid>> {
        if !runs_dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        let mut entries = fs::read_dir(runs_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    if let Ok(uuid) = Uuid::parse_str(name) {
                        runs.push(uuid);
                    }
                }
            }
        }

        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventType, PipelineState};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_event_append_and_replay() {
        let temp = TempDir::new().unwrap();
        let run_id = Uuid::new_v4();
        let store = EventStore::open(temp.path(), run_id).await.unwrap();

        let started = Event::new(run_id, EventType::RunStarted, PipelineState::Idle, "started")
            .with_source_link("https://youtu.be/x");
        let identity = Event::new(
            run_id,
            EventType::StageCompleted,
            PipelineState::IdentityComputed,
            "identity",
        );

        store.append(&started).await.unwrap();
        store.append(&identity).await.unwrap();

        let events = store.replay().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::RunStarted);
        assert_eq!(events[1].state, PipelineState::IdentityComputed);
    }

    #[tokio::test]
    async fn test_replay_missing_log_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = EventStore::existing(temp.path(), Uuid::new_v4());

        assert!(store.replay().await.unwrap().is_empty());
        assert!(!store.run_dir().exists());
    }

    #[tokio::test]
    async fn test_list_runs_ignores_other_entries() {
        let temp = TempDir::new().unwrap();
        let run_id = Uuid::new_v4();
        EventStore::open(temp.path(), run_id).await.unwrap();
        std::fs::create_dir_all(temp.path().join("not-a-run")).unwrap();
        std::fs::write(temp.path().join("stray.txt"), "x").unwrap();

        let runs = EventStore::list_runs(temp.path()).await.unwrap();
        assert_eq!(runs, vec![run_id]);
    }
}
