//! yt-dlp audio fetcher.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{run_tool, AudioFetcher};

/// Stem of the downloaded audio file inside the scratch directory
const AUDIO_STEM: &str = "audio";

/// Audio codec requested from yt-dlp's audio extraction
const AUDIO_FORMAT: &str = "opus";

/// Extensions yt-dlp leaves behind for unfinished downloads
const PARTIAL_EXTENSIONS: &[&str] = &["part", "ytdl", "temp"];

/// Audio fetcher backed by the `yt-dlp` CLI
pub struct YtDlpFetcher {
    /// Path to the yt-dlp binary (default: "yt-dlp")
    binary_path: String,
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::with_binary_path("yt-dlp")
    }
}

impl YtDlpFetcher {
    /// Create a fetcher with a custom binary path
    pub fn with_binary_path(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    fn args(source_link: &str, scratch_dir: &Path) -> Vec<String> {
        // yt-dlp picks the final extension after extraction
        let template = scratch_dir.join(format!("{}.%(ext)s", AUDIO_STEM));

        vec![
            "-f".to_string(),
            "bestaudio[ext=m4a]/bestaudio".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            AUDIO_FORMAT.to_string(),
            "--no-playlist".to_string(),
            "--output".to_string(),
            template.to_string_lossy().into_owned(),
            // Keep links that start with '-' from being read as options
            "--".to_string(),
            source_link.to_string(),
        ]
    }
}

/// Find the finished audio file yt-dlp wrote into `scratch_dir`.
///
/// Prefers the requested format; falls back to any other `audio.*` file.
async fn locate_audio(scratch_dir: &Path) -> Result<PathBuf> {
    let mut entries = fs::read_dir(scratch_dir)
        .await
        .with_context(|| format!("Failed to read scratch directory: {}", scratch_dir.display()))?;
    let mut candidates = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let stem = path.file_stem().and_then(|s| s.to_str());
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if stem == Some(AUDIO_STEM) && !PARTIAL_EXTENSIONS.contains(&ext) {
            candidates.push(path);
        }
    }

    candidates.sort();
    let preferred = candidates
        .iter()
        .position(|p| p.extension().and_then(|e| e.to_str()) == Some(AUDIO_FORMAT));

    match preferred {
        Some(i) => Ok(candidates.swap_remove(i)),
        None => candidates.into_iter().next().with_context(|| {
            format!("Audio file was not created in {}", scratch_dir.display())
        }),
    }
}

#[async_trait]
impl AudioFetcher for YtDlpFetcher {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(&self, source_link: &str, scratch_dir: &Path) -> Result<PathBuf> {
        debug!(dir = %scratch_dir.display(), "Downloading audio");

        run_tool(&self.binary_path, Self::args(source_link, scratch_dir))
            .await
            .context("Failed to download audio")?;

        locate_audio(scratch_dir).await
    }
}
