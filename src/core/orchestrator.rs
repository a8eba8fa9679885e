//! Main orchestrator for recipe extraction runs.
//!
//! Coordinates the stages of a run, the cache short-circuit, the run log,
//! scratch directory lifetime and the wall-clock ceiling.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{
    AudioFetcher, FfmpegConverter, FormatConverter, Transcriber, WhisperTranscriber,
    YtDlpFetcher,
};
use crate::config::{ResolvedConfig, DEFAULT_TIMEOUT_SECONDS};
use crate::domain::{derive_id, Event, EventType, PipelineState, RecipeRecord, Run};
use crate::extract::{build_record, extract_ingredients, extract_steps, normalize};

use super::error::{PipelineError, Stage};
use super::event_store::EventStore;
use super::store::{RecipeStore, SqliteRecipeStore};

/// Inbound request to turn a video link into a recipe
#[derive(Debug, Clone, Default)]
pub struct TranscribeRequest {
    /// Link to the cooking video
    pub source_link: String,

    /// Preferred transcription language
    pub prefer_lang: Option<String>,

    /// Authenticated caller identity
    pub caller: Option<String>,
}

impl TranscribeRequest {
    pub fn new(source_link: impl Into<String>) -> Self {
        Self {
            source_link: source_link.into(),
            ..Default::default()
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.prefer_lang = Some(lang.into());
        self
    }

    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }
}

/// Run log handle. Write failures are reported and otherwise ignored.
struct RunLog {
    store: Option<EventStore>,
}

impl RunLog {
    async fn open(runs_dir: Option<&PathBuf>, run_id: Uuid) -> Self {
        let store = match runs_dir {
            Some(dir) => match EventStore::open(dir, run_id).await {
                Ok(store) => Some(store),
                Err(e) => {
                    warn!(%run_id, error = %format!("{:#}", e), "Run log unavailable");
                    None
                }
            },
            None => None,
        };
        Self { store }
    }

    async fn record(&self, event: Event) {
        if let Some(store) = &self.store {
            if let Err(e) = store.append(&event).await {
                warn!(
                    run_id = %event.run_id,
                    error = %format!("{:#}", e),
                    "Failed to write run event"
                );
            }
        }
    }
}

/// Main pipeline orchestrator
pub struct Orchestrator {
    store: Arc<dyn RecipeStore>,
    fetcher: Arc<dyn AudioFetcher>,
    converter: Arc<dyn FormatConverter>,
    transcriber: Arc<dyn Transcriber>,

    /// Wall-clock ceiling for a whole run
    timeout: Duration,

    /// Where run logs go; no run log when unset
    runs_dir: Option<PathBuf>,

    /// Parent of per-run scratch directories; system temp when unset
    scratch_root: Option<PathBuf>,
}

impl Orchestrator {
    /// Create an orchestrator over explicit collaborators
    pub fn new(
        store: Arc<dyn RecipeStore>,
        fetcher: Arc<dyn AudioFetcher>,
        converter: Arc<dyn FormatConverter>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            store,
            fetcher,
            converter,
            transcriber,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            runs_dir: None,
            scratch_root: None,
        }
    }

    /// Wire up the SQLite store and the subprocess adapters from config
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let store = SqliteRecipeStore::open(&config.database)?;
        let tools = &config.tools;

        let orchestrator = Self::new(
            Arc::new(store),
            Arc::new(YtDlpFetcher::with_binary_path(&tools.yt_dlp)),
            Arc::new(FfmpegConverter::with_binary_path(&tools.ffmpeg)),
            Arc::new(WhisperTranscriber::new(&tools.whisper, &tools.whisper_model)),
        )
        .with_timeout(config.timeout())
        .with_runs_dir(config.runs_dir());

        Ok(match &config.scratch_root {
            Some(root) => orchestrator.with_scratch_root(root.clone()),
            None => orchestrator,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_runs_dir(mut self, runs_dir: impl Into<PathBuf>) -> Self {
        self.runs_dir = Some(runs_dir.into());
        self
    }

    pub fn with_scratch_root(mut self, scratch_root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(scratch_root.into());
        self
    }

    pub fn store(&self) -> &Arc<dyn RecipeStore> {
        &self.store
    }

    /// Turn a video link into a recipe record, reusing a stored one when present
    #[instrument(skip(self, request), fields(source_link = %request.source_link))]
    pub async fn process(&self, request: &TranscribeRequest) -> Result<RecipeRecord, PipelineError> {
        let has_caller = request
            .caller
            .as_deref()
            .is_some_and(|caller| !caller.trim().is_empty());
        if !has_caller {
            warn!("Rejected request without caller identity");
            return Err(PipelineError::Unauthenticated);
        }
        if request.source_link.trim().is_empty() {
            warn!("Rejected request without source link");
            return Err(PipelineError::InvalidInput(
                "sourceLink is required".to_string(),
            ));
        }

        let run_id = Uuid::new_v4();
        info!(%run_id, "Starting recipe run");

        let log = RunLog::open(self.runs_dir.as_ref(), run_id).await;
        let mut run = Run::new(run_id, request.source_link.clone());
        log.record(
            Event::new(run_id, EventType::RunStarted, PipelineState::Idle, "Run started")
                .with_source_link(request.source_link.clone()),
        )
        .await;

        let mut scratch: Option<TempDir> = None;
        let started = Instant::now();
        let outcome = match tokio::time::timeout(
            self.timeout,
            self.execute(&mut run, &log, request, &mut scratch),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout {
                limit_seconds: self.timeout.as_secs(),
            }),
        };

        if let Some(dir) = scratch.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(path = %path.display(), error = %e, "Failed to remove scratch directory");
            }
        }

        match outcome {
            Ok(record) => {
                info!(
                    %run_id,
                    recipe_id = %record.recipe_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Run completed"
                );
                Ok(record)
            }
            Err(e) => {
                let message = e.to_string();
                let failed_at = run.state;
                run.fail(message.clone());
                error!(%run_id, state = ?failed_at, error = %message, "Run failed");

                let mut event = Event::new(
                    run_id,
                    EventType::RunFailed,
                    PipelineState::Failed,
                    format!("Run failed after {:?}", failed_at),
                )
                .with_duration(started.elapsed().as_millis() as u64)
                .with_error(message);
                if let Some(recipe_id) = &run.recipe_id {
                    event = event.with_recipe_id(recipe_id.clone());
                }
                log.record(event).await;

                Err(e)
            }
        }
    }

    /// The stages of one run, in order
    async fn execute(
        &self,
        run: &mut Run,
        log: &RunLog,
        request: &TranscribeRequest,
        scratch: &mut Option<TempDir>,
    ) -> Result<RecipeRecord, PipelineError> {
        let link = request.source_link.as_str();
        let prefer_lang = request
            .prefer_lang
            .as_deref()
            .map(str::trim)
            .filter(|lang| !lang.is_empty());

        let started = Instant::now();
        let recipe_id = derive_id(link);
        run.recipe_id = Some(recipe_id.clone());
        let summary = format!("Recipe id {}", recipe_id);
        advance(run, log, PipelineState::IdentityComputed, summary, started).await?;

        let started = Instant::now();
        let cached = self
            .store
            .get(&recipe_id)
            .await
            .map_err(PipelineError::internal)?;
        let summary = if cached.is_some() { "Cache hit" } else { "Cache miss" };
        advance(run, log, PipelineState::CacheChecked, summary, started).await?;

        if let Some(record) = cached {
            let summary = "Returned stored record";
            advance(run, log, PipelineState::CacheHit, summary, Instant::now()).await?;
            return Ok(record);
        }

        let scratch_dir = {
            let dir = self.create_scratch().map_err(PipelineError::internal)?;
            let path = dir.path().to_path_buf();
            *scratch = Some(dir);
            path
        };

        let started = Instant::now();
        let audio = self
            .fetcher
            .fetch(link, &scratch_dir)
            .await
            .map_err(|e| PipelineError::external(Stage::AudioFetch, e))?;
        let summary = format!("Fetched audio with {}", self.fetcher.name());
        advance(run, log, Stage::AudioFetch.completes_into(), summary, started).await?;

        let started = Instant::now();
        let wav = self
            .converter
            .convert(&audio, &scratch_dir)
            .await
            .map_err(|e| PipelineError::external(Stage::Conversion, e))?;
        let summary = format!("Converted audio with {}", self.converter.name());
        advance(run, log, Stage::Conversion.completes_into(), summary, started).await?;

        let started = Instant::now();
        let transcript = self
            .transcriber
            .transcribe(&wav, prefer_lang)
            .await
            .map_err(|e| PipelineError::external(Stage::Transcription, e))?;
        let summary = format!(
            "Transcribed {} chars ({}) with {}",
            transcript.text.chars().count(),
            transcript.language,
            self.transcriber.name()
        );
        advance(run, log, Stage::Transcription.completes_into(), summary, started).await?;

        let started = Instant::now();
        let text = normalize(&transcript.text);
        let summary = format!("Normalized to {} chars", text.chars().count());
        advance(run, log, PipelineState::Normalized, summary, started).await?;

        let started = Instant::now();
        let ingredients = extract_ingredients(&text);
        let steps = extract_steps(&text);
        let summary = format!("{} ingredients, {} steps", ingredients.len(), steps.len());
        advance(run, log, PipelineState::Extracted, summary, started).await?;

        let started = Instant::now();
        let record = build_record(
            recipe_id,
            link,
            &transcript.language,
            &text,
            ingredients,
            steps,
        );
        advance(run, log, PipelineState::Assembled, "Assembled record", started).await?;

        let started = Instant::now();
        self.store
            .put(&record)
            .await
            .map_err(PipelineError::internal)?;
        advance(run, log, PipelineState::Persisted, "Persisted record", started).await?;

        Ok(record)
    }

    fn create_scratch(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("recipe-scribe-");

        let dir = match &self.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root).with_context(|| {
                    format!("Failed to create scratch root: {}", root.display())
                })?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        };

        dir.context("Failed to create scratch directory")
    }

    /// Get status of a run by ID
    pub async fn get_run_status(&self, run_id: Uuid) -> Result<Run> {
        let runs_dir = self.runs_dir.as_ref().context("No run log directory configured")?;
        let events = EventStore::existing(runs_dir, run_id).replay().await?;

        if events.is_empty() {
            anyhow::bail!("Run {} not found", run_id);
        }

        Run::from_events(&events).context("Failed to reconstruct run state")
    }

    /// List recent runs, most recent first
    pub async fn list_runs(&self, limit: usize) -> Result<Vec<Run>> {
        let Some(runs_dir) = self.runs_dir.as_ref() else {
            return Ok(Vec::new());
        };

        let mut runs = Vec::new();
        for run_id in EventStore::list_runs(runs_dir).await? {
            if let Ok(run) = self.get_run_status(run_id).await {
                runs.push(run);
            }
        }

        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs.truncate(limit);

        Ok(runs)
    }
}

/// Move the run forward and record the transition
async fn advance(
    run: &mut Run,
    log: &RunLog,
    next: PipelineState,
    summary: impl Into<String>,
    started: Instant,
) -> Result<(), PipelineError> {
    run.advance(next)?;

    let summary = summary.into();
    let duration_ms = started.elapsed().as_millis() as u64;
    info!(run_id = %run.id, state = ?next, duration_ms, "{}", summary);

    let event_type = match next {
        PipelineState::CacheHit => EventType::CacheHit,
        PipelineState::Persisted => EventType::RunCompleted,
        _ => EventType::StageCompleted,
    };
    let mut event = Event::new(run.id, event_type, next, summary).with_duration(duration_ms);
    if next == PipelineState::IdentityComputed {
        if let Some(recipe_id) = &run.recipe_id {
            event = event.with_recipe_id(recipe_id.clone());
        }
    }
    log.record(event).await;

    Ok(())
}
