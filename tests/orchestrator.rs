//! Orchestrator Integration Tests
//!
//! Runs the pipeline against in-process fake tools: cache behaviour,
//! failure isolation, scratch cleanup, timeouts and the run log.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use recipe_scribe::adapters::{AudioFetcher, FormatConverter, Transcriber, Transcript};
use recipe_scribe::core::{
    ErrorClass, MemoryRecipeStore, Orchestrator, PipelineError, RecipeStore, Stage,
    TranscribeRequest,
};
use recipe_scribe::domain::{derive_id, Category, EventType, PipelineState};
use recipe_scribe::extract::{TIKTOK_CREATOR, UNKNOWN_CREATOR};

/// Which stage the fake tools should break at
#[derive(Clone, Copy, PartialEq)]
enum FailAt {
    Nowhere,
    Fetch,
    Convert,
    Transcribe,
}

/// Fake yt-dlp/ffmpeg/whisper in one, counting calls
struct FakeTools {
    transcript: String,
    fail_at: FailAt,
    delay: Option<Duration>,
    fetches: AtomicUsize,
    converts: AtomicUsize,
    transcribes: AtomicUsize,
    scratch_dirs: Mutex<Vec<PathBuf>>,
}

impl FakeTools {
    fn new(transcript: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            fail_at: FailAt::Nowhere,
            delay: None,
            fetches: AtomicUsize::new(0),
            converts: AtomicUsize::new(0),
            transcribes: AtomicUsize::new(0),
            scratch_dirs: Mutex::new(Vec::new()),
        }
    }

    fn failing_at(mut self, fail_at: FailAt) -> Self {
        self.fail_at = fail_at;
        self
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn total_calls(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
            + self.converts.load(Ordering::SeqCst)
            + self.transcribes.load(Ordering::SeqCst)
    }

    fn scratch_dirs(&self) -> Vec<PathBuf> {
        self.scratch_dirs.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioFetcher for FakeTools {
    fn name(&self) -> &str {
        "fake-fetch"
    }

    async fn fetch(&self, _source_link: &str, scratch_dir: &Path) -> Result<PathBuf> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.scratch_dirs
            .lock()
            .unwrap()
            .push(scratch_dir.to_path_buf());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_at == FailAt::Fetch {
            anyhow::bail!("video unavailable");
        }

        let audio = scratch_dir.join("audio.opus");
        std::fs::write(&audio, b"opus")?;
        Ok(audio)
    }
}

#[async_trait]
impl FormatConverter for FakeTools {
    fn name(&self) -> &str {
        "fake-convert"
    }

    async fn convert(&self, audio: &Path, scratch_dir: &Path) -> Result<PathBuf> {
        self.converts.fetch_add(1, Ordering::SeqCst);
        assert!(audio.exists());
        if self.fail_at == FailAt::Convert {
            anyhow::bail!("unsupported codec");
        }

        let wav = scratch_dir.join("audio.wav");
        std::fs::write(&wav, b"RIFF")?;
        Ok(wav)
    }
}

#[async_trait]
impl Transcriber for FakeTools {
    fn name(&self) -> &str {
        "fake-transcribe"
    }

    async fn transcribe(&self, wav: &Path, prefer_lang: Option<&str>) -> Result<Transcript> {
        self.transcribes.fetch_add(1, Ordering::SeqCst);
        assert!(wav.exists());
        if self.fail_at == FailAt::Transcribe {
            anyhow::bail!("No speech detected");
        }

        Ok(Transcript {
            text: self.transcript.clone(),
            language: prefer_lang.unwrap_or("en").to_string(),
        })
    }
}

struct Harness {
    tools: Arc<FakeTools>,
    store: Arc<MemoryRecipeStore>,
    orchestrator: Orchestrator,
    state: TempDir,
}

impl Harness {
    fn new(tools: FakeTools) -> Self {
        let tools = Arc::new(tools);
        let store = Arc::new(MemoryRecipeStore::new());
        let state = TempDir::new().unwrap();

        let orchestrator = Orchestrator::new(
            store.clone(),
            tools.clone(),
            tools.clone(),
            tools.clone(),
        )
        .with_runs_dir(state.path().join("runs"))
        .with_scratch_root(state.path().join("scratch"));

        Self {
            tools,
            store,
            orchestrator,
            state,
        }
    }

    fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.state.path().join("scratch"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

fn request(link: &str) -> TranscribeRequest {
    TranscribeRequest::new(link).with_caller("user-1")
}

const CHICKEN: &str = "Cook the chicken breast for 10 minutes until golden";

#[tokio::test]
async fn test_fresh_run_persists_record() {
    let harness = Harness::new(FakeTools::new(CHICKEN));
    let link = "https://www.tiktok.com/@chef/video/42";

    let record = harness.orchestrator.process(&request(link)).await.unwrap();

    assert_eq!(record.recipe_id, derive_id(link));
    assert_eq!(record.source_link, link);
    assert_eq!(record.creator_handle.as_deref(), Some(TIKTOK_CREATOR));
    assert_eq!(record.title.as_deref(), Some(CHICKEN));
    assert_eq!(record.text.original, CHICKEN);
    assert_eq!(record.steps.len(), 1);
    assert_eq!(record.steps[0].duration_sec, Some(600));

    let stored = harness.store.get(&record.recipe_id).await.unwrap();
    assert_eq!(stored, Some(record));
    assert_eq!(harness.tools.total_calls(), 3);
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let harness = Harness::new(FakeTools::new("2 cups flour"));
    let link = "https://youtu.be/pancakes";

    let first = harness.orchestrator.process(&request(link)).await.unwrap();
    assert_eq!(harness.tools.total_calls(), 3);

    let second = harness.orchestrator.process(&request(link)).await.unwrap();

    assert_eq!(harness.tools.total_calls(), 3, "cache hit must not call any tool");
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    let flour = &second.ingredients[0];
    assert_eq!(flour.name, "flour");
    assert_eq!(flour.qty, Some(2.0));
    assert_eq!(flour.unit.as_deref(), Some("cups"));
    assert_eq!(flour.category, Category::Pantry);
}

#[tokio::test]
async fn test_preferred_language_reaches_record() {
    let harness = Harness::new(FakeTools::new("ceapa"));

    let record = harness
        .orchestrator
        .process(&request("https://youtu.be/ro").with_lang("ro"))
        .await
        .unwrap();

    assert_eq!(record.lang, "ro");
}

#[tokio::test]
async fn test_failures_persist_nothing_and_clean_scratch() {
    for (fail_at, stage) in [
        (FailAt::Fetch, Stage::AudioFetch),
        (FailAt::Convert, Stage::Conversion),
        (FailAt::Transcribe, Stage::Transcription),
    ] {
        let harness = Harness::new(FakeTools::new(CHICKEN).failing_at(fail_at));

        let err = harness
            .orchestrator
            .process(&request("https://youtu.be/broken"))
            .await
            .unwrap_err();

        match &err {
            PipelineError::ExternalTool { stage: failed, .. } => assert_eq!(*failed, stage),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.class(), ErrorClass::Internal);
        assert!(err
            .caller_message()
            .starts_with("Failed to transcribe from link: "));

        assert!(harness.store.is_empty());
        assert_eq!(harness.scratch_entries(), 0);
        for dir in harness.tools.scratch_dirs() {
            assert!(!dir.exists(), "scratch dir left behind: {}", dir.display());
        }
    }
}

#[tokio::test]
async fn test_failed_stage_aborts_later_stages() {
    let harness = Harness::new(FakeTools::new(CHICKEN).failing_at(FailAt::Fetch));

    harness
        .orchestrator
        .process(&request("https://youtu.be/gone"))
        .await
        .unwrap_err();

    assert_eq!(harness.tools.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(harness.tools.converts.load(Ordering::SeqCst), 0);
    assert_eq!(harness.tools.transcribes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_successful_run_removes_scratch() {
    let harness = Harness::new(FakeTools::new(CHICKEN));

    harness
        .orchestrator
        .process(&request("https://youtu.be/clean"))
        .await
        .unwrap();

    let dirs = harness.tools.scratch_dirs();
    assert_eq!(dirs.len(), 1);
    assert!(!dirs[0].exists());
    assert_eq!(harness.scratch_entries(), 0);
}

#[tokio::test]
async fn test_timeout_is_deadline_exceeded() {
    let tools = FakeTools::new(CHICKEN).slow(Duration::from_secs(5));
    let mut harness = Harness::new(tools);
    harness.orchestrator = Orchestrator::new(
        harness.store.clone(),
        harness.tools.clone(),
        harness.tools.clone(),
        harness.tools.clone(),
    )
    .with_timeout(Duration::from_millis(50))
    .with_scratch_root(harness.state.path().join("scratch"));

    let err = harness
        .orchestrator
        .process(&request("https://youtu.be/slow"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Timeout { .. }));
    assert_eq!(err.class(), ErrorClass::DeadlineExceeded);
    assert!(harness.store.is_empty());
    assert_eq!(harness.scratch_entries(), 0);
}

#[tokio::test]
async fn test_missing_caller_is_unauthenticated() {
    let harness = Harness::new(FakeTools::new(CHICKEN));

    let err = harness
        .orchestrator
        .process(&TranscribeRequest::new("https://youtu.be/x"))
        .await
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::Unauthenticated);
    assert_eq!(harness.tools.total_calls(), 0);
}

#[tokio::test]
async fn test_blank_link_is_invalid_argument() {
    let harness = Harness::new(FakeTools::new(CHICKEN));

    let err = harness
        .orchestrator
        .process(&request("  "))
        .await
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::InvalidArgument);
    assert_eq!(err.caller_message(), "sourceLink is required");
    assert_eq!(harness.tools.total_calls(), 0);
}

#[tokio::test]
async fn test_unparseable_link_still_produces_record() {
    let harness = Harness::new(FakeTools::new(CHICKEN));

    let record = harness
        .orchestrator
        .process(&request("not a url at all"))
        .await
        .unwrap();

    assert_eq!(record.creator_handle.as_deref(), Some(UNKNOWN_CREATOR));
    assert_eq!(record.recipe_id, derive_id("not a url at all"));
}

#[tokio::test]
async fn test_parallel_runs_for_different_links() {
    let harness = Arc::new(Harness::new(FakeTools::new(CHICKEN)));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let harness = Arc::clone(&harness);
            tokio::spawn(async move {
                let link = format!("https://youtu.be/video{}", i);
                harness.orchestrator.process(&request(&link)).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(harness.store.len(), 4);
    assert_eq!(harness.tools.total_calls(), 12);
}

#[tokio::test]
async fn test_run_log_records_transitions() {
    let harness = Harness::new(FakeTools::new(CHICKEN));
    let link = "https://youtu.be/logged";

    harness.orchestrator.process(&request(link)).await.unwrap();
    harness.orchestrator.process(&request(link)).await.unwrap();

    let runs = harness.orchestrator.list_runs(10).await.unwrap();
    assert_eq!(runs.len(), 2);

    let fresh = runs
        .iter()
        .find(|run| run.state == PipelineState::Persisted)
        .unwrap();
    assert_eq!(fresh.source_link, link);
    assert_eq!(fresh.recipe_id, Some(derive_id(link)));
    assert_eq!(
        fresh.history,
        vec![
            PipelineState::Idle,
            PipelineState::IdentityComputed,
            PipelineState::CacheChecked,
            PipelineState::AudioFetched,
            PipelineState::ConvertedToWav,
            PipelineState::Transcribed,
            PipelineState::Normalized,
            PipelineState::Extracted,
            PipelineState::Assembled,
            PipelineState::Persisted,
        ]
    );

    let cached = runs
        .iter()
        .find(|run| run.state == PipelineState::CacheHit)
        .unwrap();
    assert!(cached.succeeded());

    let status = harness
        .orchestrator
        .get_run_status(cached.id)
        .await
        .unwrap();
    assert_eq!(status.history.last(), Some(&PipelineState::CacheHit));

    let events = recipe_scribe::core::EventStore::existing(
        &harness.state.path().join("runs"),
        cached.id,
    )
    .replay()
    .await
    .unwrap();
    assert_eq!(events.first().map(|e| e.event_type), Some(EventType::RunStarted));
    assert_eq!(events.last().map(|e| e.event_type), Some(EventType::CacheHit));
}

#[tokio::test]
async fn test_failed_run_is_logged_with_error() {
    let harness = Harness::new(FakeTools::new(CHICKEN).failing_at(FailAt::Convert));

    harness
        .orchestrator
        .process(&request("https://youtu.be/codec"))
        .await
        .unwrap_err();

    let runs = harness.orchestrator.list_runs(10).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].state, PipelineState::Failed);
    assert!(runs[0].error.as_deref().unwrap().contains("unsupported codec"));
    assert_eq!(
        runs[0].history.iter().rev().nth(1),
        Some(&PipelineState::AudioFetched)
    );
}
