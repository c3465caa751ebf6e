//! Ascent AI - personal branding co-pilot
//!
//! CLI entry point.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::info;

use ascent::cli::{Cli, Command, log_path};
use ascent::config::Config;
use ascent::extract::{UploadedDocument, extract_batch};
use ascent::repl;

fn setup_logging(level: Option<&str>) -> Result<()> {
    let log_file_path = log_path();
    if let Some(log_dir) = log_file_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Write to the log file, never to stdout/stderr
    let level = level
        .and_then(|l| l.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);
    let log_file = fs::File::create(&log_file_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log level priority: CLI flag > config file > INFO
    let level = cli
        .log_level
        .clone()
        .or_else(|| Config::load_log_level(cli.config.as_ref()));
    setup_logging(level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        profiles = config.llm.profiles.len(),
        exports = %config.exports.dir.display(),
        "Ascent loaded config"
    );

    match cli.command {
        Some(Command::Chat) | None => repl::run_interactive(&config).await,
        Some(Command::Config) => cmd_config(&config),
        Some(Command::Extract { files }) => cmd_extract(&files),
    }
}

/// Print the resolved configuration
fn cmd_config(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    print!("{}", yaml);
    Ok(())
}

/// Extract text from files and print it
fn cmd_extract(files: &[PathBuf]) -> Result<()> {
    let mut docs = Vec::new();
    let mut failed = 0;
    for path in files {
        match UploadedDocument::from_path(path) {
            Ok(doc) => docs.push(doc),
            Err(e) => {
                eprintln!("{} Error reading {}: {}", "x".red(), path.display(), e);
                failed += 1;
            }
        }
    }

    let batch = extract_batch(&docs);
    for (name, e) in &batch.failures {
        eprintln!("{} Error processing file {}: {}", "x".red(), name, e);
    }
    failed += batch.failures.len();

    if batch.is_empty() {
        return Err(eyre::eyre!("No text could be extracted from {} file(s)", files.len()));
    }
    print!("{}", batch.text.trim_end());
    println!();
    if failed > 0 {
        info!(failed, "cmd_extract: some files failed");
    }
    Ok(())
}
