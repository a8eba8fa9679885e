//! Whisper transcription backend.
//!
//! Shells out to a local whisper binary and reads its JSON output.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{run_tool, Transcriber, Transcript};

/// Language assumed when whisper reports none and none was requested
pub const DEFAULT_LANGUAGE: &str = "en";

/// Whisper output JSON structure
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    text: String,
    #[serde(default)]
    language: Option<String>,
}

/// Transcriber backed by the `whisper` CLI
pub struct WhisperTranscriber {
    binary_path: String,
    model: String,
}

impl WhisperTranscriber {
    /// Create a transcriber using `model` (e.g. "small")
    pub fn new(binary_path: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Turn whisper's JSON into a transcript.
///
/// Segment texts arrive space-joined; an empty transcript means no speech
/// was detected.
fn parse_output(json: &str, prefer_lang: Option<&str>) -> Result<Transcript> {
    let whisper: WhisperOutput =
        serde_json::from_str(json).context("Failed to parse whisper JSON")?;

    let text = whisper.text.trim().to_string();
    if text.is_empty() {
        anyhow::bail!("No speech detected");
    }

    let language = whisper
        .language
        .filter(|l| !l.is_empty())
        .or_else(|| prefer_lang.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    Ok(Transcript { text, language })
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    fn name(&self) -> &str {
        "whisper"
    }

    async fn transcribe(&self, wav: &Path, prefer_lang: Option<&str>) -> Result<Transcript> {
        let output_dir = wav.parent().unwrap_or(Path::new("."));

        let mut args = vec![
            wav.as_os_str().to_owned(),
            "--model".into(),
            self.model.as_str().into(),
            "--output_dir".into(),
            output_dir.as_os_str().to_owned(),
            "--output_format".into(),
            "json".into(),
            "--beam_size".into(),
            "5".into(),
            "--best_of".into(),
            "5".into(),
            "--temperature".into(),
            "0".into(),
            "--condition_on_previous_text".into(),
            "False".into(),
        ];
        if let Some(lang) = prefer_lang.filter(|l| !l.is_empty()) {
            args.push("--language".into());
            args.push(lang.into());
        }

        run_tool(&self.binary_path, &args)
            .await
            .context("Transcription failed")?;

        let stem = wav.file_stem().unwrap_or_default().to_string_lossy();
        let json_path = output_dir.join(format!("{}.json", stem));

        let json_content = tokio::fs::read_to_string(&json_path)
            .await
            .context("Failed to read whisper output")?;

        parse_output(&json_content, prefer_lang)
    }
}
