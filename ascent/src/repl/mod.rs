//! Interactive REPL for Ascent
//!
//! Free text answers the active session's current question; slash commands
//! manage sessions, ideas, drafts and exports.

mod commands;
mod session;

pub use commands::{ExportTarget, ReplCommand, parse_command};
pub use session::{ReplSession, SlashResult};

use eyre::{Context, Result};
use tracing::info;

use crate::agents::{AgentInvoker, AgentRole};
use crate::config::Config;
use crate::prompts::{PromptLoader, TaskBuilder};
use crate::workflow::Workflow;

/// Run the interactive REPL
///
/// This is the main entry point for `ascent chat`.
pub async fn run_interactive(config: &Config) -> Result<()> {
    // Validate API keys early
    config.validate()?;

    let invoker = AgentInvoker::from_config(&config.llm).context("Failed to create LLM clients")?;
    for role in AgentRole::ALL {
        info!(%role, model = invoker.model_for(role).unwrap_or("-"), "Role bound");
    }
    let loader = match &config.prompts.dir {
        Some(dir) => PromptLoader::new(dir),
        None => PromptLoader::embedded_only(),
    };
    let workflow = Workflow::new(invoker, TaskBuilder::new(loader), config.workflow.clone());

    let mut repl = ReplSession::new(workflow, config.exports.dir.clone());
    repl.run().await
}
