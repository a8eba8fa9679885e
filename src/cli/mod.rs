//! Command-line interface for recipe-scribe.
//!
//! Provides commands for transcribing a video link into a recipe, reading
//! stored recipes, offline extraction from a transcript, and inspecting
//! run logs.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::config::ResolvedConfig;
use crate::core::{Orchestrator, RecipeStore, SqliteRecipeStore, TranscribeRequest};
use crate::domain::{derive_id, PipelineState, RecipeId, RecipeRecord};
use crate::extract::{assemble, normalize};

/// recipe-scribe - Turn cooking videos into structured recipes
#[derive(Parser, Debug)]
#[command(name = "recipe-scribe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe a video link into a recipe (cached per link)
    Transcribe {
        /// Video link (YouTube, TikTok, ...)
        link: String,

        /// Preferred transcription language (e.g. "en", "ro")
        #[arg(short, long)]
        lang: Option<String>,

        /// Caller identity
        #[arg(long, env = "RECIPE_SCRIBE_CALLER")]
        caller: Option<String>,
    },

    /// Show a stored recipe
    Show {
        /// Recipe ID (sha256 of the link)
        recipe_id: String,
    },

    /// Print the recipe ID for a link
    Id {
        /// Video link
        link: String,
    },

    /// Extract a recipe from an existing transcript (nothing is stored)
    Extract {
        /// Transcript file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Link the transcript came from
        #[arg(long)]
        link: Option<String>,

        /// Transcript language
        #[arg(long, default_value = "en")]
        lang: String,
    },

    /// List recent runs
    Runs {
        /// Maximum number of runs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Check the status of a run
    Status {
        /// Run ID (UUID)
        run_id: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self, config: ResolvedConfig) -> Result<()> {
        match self.command {
            Commands::Transcribe { link, lang, caller } => {
                transcribe(&config, link, lang, caller).await
            }
            Commands::Show { recipe_id } => show_recipe(&config, &recipe_id).await,
            Commands::Id { link } => {
                println!("{}", derive_id(&link));
                Ok(())
            }
            Commands::Extract { input, link, lang } => extract(input, link, &lang),
            Commands::Runs { limit } => list_runs(&config, limit).await,
            Commands::Status { run_id } => show_status(&config, &run_id).await,
            Commands::Config => show_config(&config),
        }
    }
}

fn print_record(record: &RecipeRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(record).context("Failed to serialize recipe")?;
    println!("{}", json);
    Ok(())
}

/// Run the full pipeline for one link
async fn transcribe(
    config: &ResolvedConfig,
    link: String,
    lang: Option<String>,
    caller: Option<String>,
) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config)?;

    let request = TranscribeRequest {
        source_link: link,
        prefer_lang: lang,
        caller,
    };

    match orchestrator.process(&request).await {
        Ok(record) => print_record(&record),
        Err(e) => {
            eprintln!("error[{}]: {}", e.class(), e.caller_message());
            std::process::exit(1);
        }
    }
}

/// Print a stored recipe
async fn show_recipe(config: &ResolvedConfig, recipe_id: &str) -> Result<()> {
    let store = SqliteRecipeStore::open(&config.database)?;
    let id = RecipeId::from_raw(recipe_id.trim());

    match store.get(&id).await? {
        Some(record) => print_record(&record),
        None => anyhow::bail!("Recipe {} not found", id),
    }
}

/// Offline extraction over a transcript file or stdin
fn extract(input_file: Option<PathBuf>, link: Option<String>, lang: &str) -> Result<()> {
    let raw = if let Some(path) = input_file {
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        anyhow::bail!("No input provided. Use --input <file> or pipe to stdin");
    };

    let text = normalize(&raw);
    let link = link.unwrap_or_default();
    // Without a link the record is keyed by its own text
    let recipe_id = if link.is_empty() {
        derive_id(&text)
    } else {
        derive_id(&link)
    };

    print_record(&assemble(recipe_id, &link, lang, &text))
}

/// List recent runs
async fn list_runs(config: &ResolvedConfig, limit: usize) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config)?;
    let runs = orchestrator.list_runs(limit).await?;

    if runs.is_empty() {
        println!("No runs found");
        return Ok(());
    }

    println!("{:<38} {:<14} {:<18} {}", "RUN ID", "RECIPE", "STATE", "STARTED");
    println!("{}", "-".repeat(96));

    for run in runs {
        let recipe = run
            .recipe_id
            .as_ref()
            .map(|id| id.as_str().chars().take(12).collect::<String>())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<38} {:<14} {:<18} {}",
            run.id,
            recipe,
            state_label(run.state),
            run.started_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

/// Show the status of a run
async fn show_status(config: &ResolvedConfig, run_id_str: &str) -> Result<()> {
    let run_id = Uuid::parse_str(run_id_str)
        .with_context(|| format!("Invalid run ID: {}", run_id_str))?;

    let orchestrator = Orchestrator::from_config(config)?;
    let run = orchestrator.get_run_status(run_id).await?;

    println!("Run ID: {}", run.id);
    println!("Link: {}", run.source_link);
    if let Some(recipe_id) = &run.recipe_id {
        println!("Recipe: {}", recipe_id);
    }
    println!("State: {}", state_label(run.state));
    println!("Started: {}", run.started_at);
    if let Some(completed) = run.completed_at {
        println!("Completed: {}", completed);
    }
    if let Some(error) = &run.error {
        println!("Error: {}", error);
    }
    println!("\nStages:");
    for state in &run.history {
        println!("  {}", state_label(*state));
    }

    Ok(())
}

fn state_label(state: PipelineState) -> String {
    serde_json::to_value(state)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", state))
}

/// Print the resolved configuration
fn show_config(config: &ResolvedConfig) -> Result<()> {
    let config_file = config
        .config_file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none - using defaults)".to_string());

    println!("Config file: {}", config_file);
    println!();
    println!("Paths:");
    println!("  Home:     {}", config.home.display());
    println!("  Database: {}", config.database.display());
    println!("  Runs:     {}", config.runs_dir().display());
    match &config.scratch_root {
        Some(root) => println!("  Scratch:  {}", root.display()),
        None => println!("  Scratch:  (system temp)"),
    }
    println!();
    println!("Tools:");
    println!("  yt-dlp:        {}", config.tools.yt_dlp);
    println!("  ffmpeg:        {}", config.tools.ffmpeg);
    println!("  whisper:       {}", config.tools.whisper);
    println!("  whisper model: {}", config.tools.whisper_model);
    println!();
    println!("Pipeline:");
    println!("  Timeout: {}s", config.timeout_seconds);

    Ok(())
}
