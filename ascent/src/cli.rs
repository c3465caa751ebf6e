//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Ascent AI - personal branding co-pilot
#[derive(Parser)]
#[command(
    name = "ascent",
    about = "Guided personal-branding content assistant: strategy, post ideas and drafts from LLM agents",
    version,
    after_help = "Logs are written to: ~/.local/share/ascent/logs/ascent.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long, global = true, help = "Log level (overrides config)")]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to chat)
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start an interactive branding session
    Chat,

    /// Print the resolved configuration as YAML
    Config,

    /// Extract plain text from documents (PDF, TXT, MD)
    Extract {
        /// Files to extract
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
}

/// Where the log file lives
pub fn log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ascent")
        .join("logs")
        .join("ascent.log")
}
