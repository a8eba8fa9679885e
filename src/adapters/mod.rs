//! Adapter interfaces for the external media tools.
//!
//! The orchestrator only sees these traits; the subprocess implementations
//! (yt-dlp, ffmpeg, whisper) can be swapped for fakes in tests.

pub mod ffmpeg;
pub mod whisper;
pub mod ytdlp;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

pub use ffmpeg::FfmpegConverter;
pub use whisper::WhisperTranscriber;
pub use ytdlp::YtDlpFetcher;

/// Text recovered from an audio track
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    /// Raw spoken-word text
    pub text: String,

    /// Detected (or requested) language code
    pub language: String,
}

/// Downloads the audio track behind a video link
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Write the link's audio into `scratch_dir` and return its path
    async fn fetch(&self, source_link: &str, scratch_dir: &Path) -> Result<PathBuf>;
}

/// Converts downloaded audio into 16 kHz mono WAV
#[async_trait]
pub trait FormatConverter: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Convert `audio` into a WAV file inside `scratch_dir` and return its path
    async fn convert(&self, audio: &Path, scratch_dir: &Path) -> Result<PathBuf>;
}

/// Speech-to-text over a WAV file
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Transcribe `wav`, preferring `prefer_lang` when given
    async fn transcribe(&self, wav: &Path, prefer_lang: Option<&str>) -> Result<Transcript>;
}

/// Run an external tool to completion, failing on a non-zero exit.
///
/// The child is killed if the returned future is dropped, so a pipeline
/// timeout does not leave tools running.
pub(crate) async fn run_tool<I, S>(program: &str, args: I) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("Failed to start {}", program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);
        anyhow::bail!(
            "{} failed with exit code {}: {}",
            program,
            exit_code,
            stderr.trim()
        );
    }

    Ok(output)
}

/// Fail unless a tool actually produced its output file
pub(crate) async fn ensure_output(path: &Path, what: &str) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => anyhow::bail!("{} was not created: {}", what, path.display()),
    }
}
