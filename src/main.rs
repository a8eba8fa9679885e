//! recipe-scribe CLI entrypoint

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recipe_scribe::cli::Cli;
use recipe_scribe::config::load_config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (stdout is reserved for records)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Parse, load config once, execute
    let cli = Cli::parse();
    let config = load_config()?;
    cli.execute(config).await
}
