//! ffmpeg WAV converter.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{ensure_output, run_tool, FormatConverter};

const WAV_FILE: &str = "audio.wav";

/// Sample rate expected by the transcriber
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Converter backed by the `ffmpeg` CLI
pub struct FfmpegConverter {
    binary_path: String,
}

impl Default for FfmpegConverter {
    fn default() -> Self {
        Self::with_binary_path("ffmpeg")
    }
}

impl FfmpegConverter {
    pub fn with_binary_path(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }
}

#[async_trait]
impl FormatConverter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn convert(&self, audio: &Path, scratch_dir: &Path) -> Result<PathBuf> {
        let output = scratch_dir.join(WAV_FILE);
        let sample_rate = SAMPLE_RATE_HZ.to_string();

        let args: [&OsStr; 8] = [
            OsStr::new("-i"),
            audio.as_os_str(),
            OsStr::new("-ar"),
            OsStr::new(&sample_rate),
            OsStr::new("-ac"),
            OsStr::new("1"),
            OsStr::new("-y"),
            output.as_os_str(),
        ];

        run_tool(&self.binary_path, args)
            .await
            .context("Failed to convert audio")?;
        ensure_output(&output, "WAV file").await?;

        Ok(output)
    }
}
