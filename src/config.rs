//! Configuration for recipe-scribe.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (RECIPE_SCRIBE_HOME, RECIPE_SCRIBE_DB,
//!    YT_DLP_PATH, FFMPEG_PATH, WHISPER_PATH, WHISPER_MODEL)
//! 2. Config file (.recipe-scribe/config.yaml)
//! 3. Defaults (~/.recipe-scribe)
//!
//! Config file discovery:
//! - Searches current directory and parents for .recipe-scribe/config.yaml
//! - Relative paths in the file resolve against the .recipe-scribe/ directory
//!
//! Configuration is loaded once in `main` and handed to whoever needs it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

const CONFIG_DIR: &str = ".recipe-scribe";
const CONFIG_FILE: &str = "config.yaml";

/// Default wall-clock ceiling for one pipeline run (9 minutes)
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 540;

/// Default whisper model
pub const DEFAULT_WHISPER_MODEL: &str = "small";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (database, run logs)
    pub home: Option<String>,
    /// Recipe database file
    pub database: Option<String>,
    /// Parent directory for per-run scratch files (system temp if unset)
    pub scratch: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsConfig {
    pub yt_dlp: Option<String>,
    pub ffmpeg: Option<String>,
    pub whisper: Option<String>,
    pub whisper_model: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    pub timeout_seconds: Option<u64>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// SQLite recipe database
    pub database: PathBuf,
    /// Parent directory for scratch files
    pub scratch_root: Option<PathBuf>,
    /// External tool settings
    pub tools: ToolSettings,
    /// Wall-clock ceiling per run
    pub timeout_seconds: u64,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    pub yt_dlp: String,
    pub ffmpeg: String,
    pub whisper: String,
    pub whisper_model: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            yt_dlp: "yt-dlp".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            whisper: "whisper".to_string(),
            whisper_model: DEFAULT_WHISPER_MODEL.to_string(),
        }
    }
}

impl ResolvedConfig {
    /// Directory holding per-run event logs
    pub fn runs_dir(&self) -> PathBuf {
        self.home.join("runs")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Merge defaults, an optional config file and environment lookups
fn resolve<F>(
    default_home: PathBuf,
    config: Option<(PathBuf, ConfigFile)>,
    env: F,
) -> ResolvedConfig
where
    F: Fn(&str) -> Option<String>,
{
    let (config_file, file) = match config {
        Some((path, file)) => (Some(path), file),
        None => (None, ConfigFile::default()),
    };

    let base_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let home = env("RECIPE_SCRIBE_HOME")
        .map(PathBuf::from)
        .or_else(|| file.paths.home.as_deref().map(|p| resolve_path(&base_dir, p)))
        .unwrap_or(default_home);

    let database = env("RECIPE_SCRIBE_DB")
        .map(PathBuf::from)
        .or_else(|| {
            file.paths
                .database
                .as_deref()
                .map(|p| resolve_path(&base_dir, p))
        })
        .unwrap_or_else(|| home.join("recipes.db"));

    let scratch_root = file
        .paths
        .scratch
        .as_deref()
        .map(|p| resolve_path(&base_dir, p));

    let defaults = ToolSettings::default();
    let tools = ToolSettings {
        yt_dlp: env("YT_DLP_PATH")
            .or(file.tools.yt_dlp)
            .unwrap_or(defaults.yt_dlp),
        ffmpeg: env("FFMPEG_PATH")
            .or(file.tools.ffmpeg)
            .unwrap_or(defaults.ffmpeg),
        whisper: env("WHISPER_PATH")
            .or(file.tools.whisper)
            .unwrap_or(defaults.whisper),
        whisper_model: env("WHISPER_MODEL")
            .or(file.tools.whisper_model)
            .unwrap_or(defaults.whisper_model),
    };

    ResolvedConfig {
        home,
        database,
        scratch_root,
        tools,
        timeout_seconds: file
            .pipeline
            .timeout_seconds
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        config_file,
    }
}

/// Load configuration from all sources
pub fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let config = match find_config_file(&cwd) {
        Some(path) => {
            let file = load_config_file(&path)?;
            Some((path, file))
        }
        None => None,
    };

    Ok(resolve(default_home, config, |key| {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }))
}
