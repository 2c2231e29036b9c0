//! Taskpilot file manager command-line entry point.

mod cli;
mod commands;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never mix with command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting taskpilot-files"
    );

    let mut files_config = match config::FilesConfig::load() {
        Ok(c) => {
            tracing::info!(url = %c.api_base_url, "configuration loaded");
            c
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            let mut c = config::FilesConfig::default();
            c.apply_env(|key| std::env::var(key).ok());
            c
        }
    };
    if let Some(url) = cli.api_url {
        files_config.api_base_url = url;
    }
    if let Some(max) = cli.max_files {
        files_config.max_files = max;
    }

    commands::run(cli.command, &files_config).await
}
