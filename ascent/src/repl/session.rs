//! REPL session management

use std::path::PathBuf;

use chrono::Local;
use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, error};

use super::commands::{ExportTarget, HELP, ReplCommand, parse_command};
use crate::agents::Generator;
use crate::export::{export_draft, export_strategy};
use crate::extract::UploadedDocument;
use crate::ideas::IdeaError;
use crate::llm::Role;
use crate::session::{Session, SessionStore};
use crate::workflow::{Input, Notice, RegenScope, ResumeChoice, Stage, StepOutcome, Workflow, WorkflowError};

/// Interactive REPL over an in-memory session store
pub struct ReplSession<G: Generator> {
    workflow: Workflow<G>,
    store: SessionStore,
    exports_dir: PathBuf,
}

/// Result of handling a slash command
#[derive(Debug, PartialEq, Eq)]
pub enum SlashResult {
    Continue,
    Quit,
}

impl<G: Generator> ReplSession<G> {
    pub fn new(workflow: Workflow<G>, exports_dir: PathBuf) -> Self {
        Self {
            workflow,
            store: SessionStore::new(),
            exports_dir,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();
        self.new_session()?;
        self.print_transcript();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));
            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    let result = if input.starts_with('/') {
                        match parse_command(input) {
                            Ok(cmd) => self.handle_command(cmd).await,
                            Err(usage) => {
                                println!("{} {}", "?".yellow(), usage);
                                println!("Type {} for available commands", "/help".yellow());
                                Ok(SlashResult::Continue)
                            }
                        }
                    } else {
                        self.handle_text(input).await.map(|_| SlashResult::Continue)
                    };

                    match result {
                        Ok(SlashResult::Quit) => break,
                        Ok(SlashResult::Continue) => {}
                        Err(e) => {
                            error!(error = %e, "REPL command failed");
                            println!("{} {}", "Error:".red(), e);
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Create, activate and start a session
    pub fn new_session(&mut self) -> Result<()> {
        let id = self.store.create();
        self.store.set_active(&id)?;
        let session = self.store.get_mut(&id)?;
        self.workflow.begin(session)?;
        debug!(%id, "ReplSession::new_session: started");
        Ok(())
    }

    /// Free text goes to the active session's current stage
    pub async fn handle_text(&mut self, text: &str) -> Result<()> {
        let session = self.store.active_mut()?;
        let input = match session.stage() {
            Stage::AwaitingResumeUpload => {
                println!("Use {} to upload your resume.", "/upload <file>".yellow());
                return Ok(());
            }
            _ => Input::text(text),
        };
        let drafted = session.stage() == Stage::PostDrafted;
        self.step(input).await?;
        if drafted && self.store.active()?.stage() == Stage::PostDrafted {
            self.print_draft()?;
        }
        Ok(())
    }

    async fn step(&mut self, input: Input) -> Result<()> {
        let session = self.store.active_mut()?;
        let before = session.messages().len();
        let result = self.workflow.step(session, input).await;
        let session = self.store.active()?;
        print_new_messages(session, before);
        let outcome = result?;
        print_notices(&outcome);
        Ok(())
    }

    /// Execute one slash command
    pub async fn handle_command(&mut self, cmd: ReplCommand) -> Result<SlashResult> {
        debug!(?cmd, "ReplSession::handle_command: called");
        match cmd {
            ReplCommand::Help => print_help(),
            ReplCommand::Quit => return Ok(SlashResult::Quit),
            ReplCommand::New => {
                self.new_session()?;
                self.print_transcript();
            }
            ReplCommand::Sessions => self.print_sessions(),
            ReplCommand::Switch(needle) => {
                let id = self.store.resolve(&needle)?;
                self.store.set_active(&id)?;
                self.print_transcript();
            }
            ReplCommand::Rename(title) => {
                let id = self.store.active()?.id().clone();
                self.store.rename(&id, title)?;
                println!("{}", "Session renamed.".dimmed());
            }
            ReplCommand::Delete(needle) => {
                let id = self.store.resolve(&needle)?;
                let session = self.store.delete(&id)?;
                println!("Deleted '{}'", session.title);
                if self.store.active_id().is_none() {
                    println!("{}", "No active session. Use /new or /switch.".dimmed());
                }
            }
            ReplCommand::Status => {
                let session = self.store.active()?;
                println!(
                    "{} [{}] stage: {}",
                    session.title.bright_white(),
                    session.id().short(),
                    session.stage().to_string().cyan()
                );
                if let Some(prompt) = session.stage().prompt() {
                    println!("{}", prompt.dimmed());
                }
            }
            ReplCommand::Transcript => self.print_transcript(),
            ReplCommand::Upload(paths) => {
                let mut docs = Vec::new();
                for path in &paths {
                    match UploadedDocument::from_path(path) {
                        Ok(doc) => docs.push(doc),
                        Err(e) => println!("{} Error reading {}: {}", "!".red(), path, e),
                    }
                }
                if docs.is_empty() {
                    return Ok(SlashResult::Continue);
                }
                let stage = self.store.active()?.stage();
                if stage == Stage::AwaitingResumeChoice {
                    self.step(Input::ResumeChoice(ResumeChoice::Upload)).await?;
                }
                self.step(Input::Documents(docs)).await?;
            }
            ReplCommand::Skip => {
                let input = match self.store.active()?.stage() {
                    Stage::AwaitingResumeChoice => Input::ResumeChoice(ResumeChoice::Skip),
                    _ => Input::SkipSamples,
                };
                self.step(input).await?;
            }
            ReplCommand::Retry => self.step(Input::Retry).await?,
            ReplCommand::Platform(name) => {
                let session = self.store.active_mut()?;
                let outcome = self.workflow.set_platform(session, &name);
                print_notices(&outcome);
            }
            ReplCommand::Strategy(version) => {
                let session = self.store.active()?;
                let strategy = match version {
                    Some(v) => self.workflow.strategy_version(session, v)?,
                    None => session.current_strategy().ok_or(WorkflowError::NoStrategy)?,
                };
                println!(
                    "{}",
                    format!(
                        "Version {} ({})",
                        strategy.version,
                        strategy.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                    )
                    .bright_cyan()
                );
                println!("{}", strategy.content);
            }
            ReplCommand::Versions => {
                let session = self.store.active()?;
                if session.strategy_history().is_empty() {
                    println!("{}", "No strategy yet.".dimmed());
                }
                for v in session.strategy_history() {
                    println!(
                        "  v{} {}",
                        v.version,
                        v.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }
            ReplCommand::Ideas => self.print_ideas()?,
            ReplCommand::More => {
                let session = self.store.active_mut()?;
                let outcome = self.workflow.more_ideas(session).await?;
                print_notices(&outcome);
                self.print_ideas()?;
            }
            ReplCommand::Toggle { theme, idea } => {
                let session = self.store.active_mut()?;
                let name = theme_name(session, theme)?;
                let checked = self.workflow.toggle_idea(session, &name, idea)?;
                let label = if checked { "Checked." } else { "Unchecked." };
                println!("{}", label.dimmed());
            }
            ReplCommand::Move { theme, idea, to } => {
                let session = self.store.active_mut()?;
                let name = theme_name(session, theme)?;
                self.workflow.move_idea(session, &name, idea, &to)?;
                self.print_ideas()?;
            }
            ReplCommand::Add { theme, text } => {
                let session = self.store.active_mut()?;
                let name = theme_name(session, theme)?;
                let outcome = self.workflow.add_idea(session, &name, &text)?;
                print_notices(&outcome);
            }
            ReplCommand::RefineIdeas(critique) => {
                let session = self.store.active_mut()?;
                let outcome = self.workflow.refine_ideas(session, &critique).await?;
                print_notices(&outcome);
                self.print_ideas()?;
            }
            ReplCommand::Regen(theme) => {
                let session = self.store.active_mut()?;
                let scope = match theme {
                    Some(t) => RegenScope::Theme(theme_name(session, t)?),
                    None => RegenScope::All,
                };
                let outcome = self.workflow.regenerate_ideas(session, scope).await?;
                print_notices(&outcome);
                self.print_ideas()?;
            }
            ReplCommand::Similar { theme, idea } => {
                let session = self.store.active_mut()?;
                let name = theme_name(session, theme)?;
                let outcome = self.workflow.similar_ideas(session, &name, idea).await?;
                print_notices(&outcome);
                self.print_ideas()?;
            }
            ReplCommand::Write { theme, idea } => {
                let session = self.store.active_mut()?;
                let name = theme_name(session, theme)?;
                println!("{}", "The Ghostwriter is drafting your post...".dimmed());
                let outcome = self.workflow.select_idea(session, &name, idea).await?;
                print_notices(&outcome);
                if outcome.stage == Stage::PostDrafted {
                    self.print_draft()?;
                }
            }
            ReplCommand::Draft => self.print_draft()?,
            ReplCommand::Refine(feedback) => {
                let session = self.store.active_mut()?;
                let outcome = self.workflow.refine_draft(session, &feedback).await?;
                print_notices(&outcome);
                self.print_draft()?;
            }
            ReplCommand::Edit(text) => {
                let session = self.store.active_mut()?;
                self.workflow.edit_draft(session, &text)?;
                println!("{}", "Draft updated.".dimmed());
            }
            ReplCommand::Review => {
                let session = self.store.active_mut()?;
                self.workflow.review_draft(session).await?;
                self.print_draft()?;
            }
            ReplCommand::Drafts => {
                let session = self.store.active()?;
                if session.draft_history().is_empty() {
                    println!("{}", "No drafts yet.".dimmed());
                }
                for (i, d) in session.draft_history().iter().enumerate() {
                    println!(
                        "  {}. {}  {}",
                        i + 1,
                        d.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                        preview(&d.content, 60).dimmed()
                    );
                }
            }
            ReplCommand::Restore(index) => {
                let session = self.store.active_mut()?;
                let outcome = self.workflow.restore_draft(session, index)?;
                print_notices(&outcome);
            }
            ReplCommand::Export(target) => {
                let session = self.store.active()?;
                let path = match target {
                    ExportTarget::Strategy => export_strategy(session, &self.exports_dir)?,
                    ExportTarget::Post => export_draft(session, &self.exports_dir, Local::now())?,
                };
                println!("Exported to {}", path.display().to_string().bright_white());
            }
        }
        Ok(SlashResult::Continue)
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Ascent AI: your personal branding co-pilot".bright_cyan().bold());
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    fn print_transcript(&self) {
        match self.store.active() {
            Ok(session) => {
                println!("{}", format!("== {} ==", session.title).bright_cyan());
                print_new_messages(session, 0);
            }
            Err(_) => println!("{}", "No active session.".dimmed()),
        }
    }

    fn print_sessions(&self) {
        if self.store.is_empty() {
            println!("{}", "No sessions.".dimmed());
            return;
        }
        let active = self.store.active_id();
        for session in self.store.list_recent() {
            let marker = if Some(session.id()) == active { "*" } else { " " };
            println!("{} {}", marker.bright_green(), session_line(session));
        }
    }

    fn print_ideas(&self) -> Result<()> {
        let session = self.store.active()?;
        if session.post_ideas.is_empty() {
            println!("{}", "No post ideas yet.".dimmed());
            return Ok(());
        }
        for (t, (theme, ideas)) in session.post_ideas.themes().enumerate() {
            println!("{} {}", format!("{}.", t + 1).bright_cyan(), theme.bright_cyan().bold());
            for (i, idea) in ideas.iter().enumerate() {
                let check = if idea.checked { "[x]".green() } else { "[ ]".normal() };
                println!("   {} {}. {}", check, i + 1, idea.text);
            }
        }
        Ok(())
    }

    fn print_draft(&self) -> Result<()> {
        print!("{}", draft_view(self.store.active()?)?);
        Ok(())
    }
}

/// The current draft with its idea and reviewer feedback, ready to print
fn draft_view(session: &Session) -> Result<String, WorkflowError> {
    let draft = session.draft.as_deref().ok_or(WorkflowError::NoDraft)?;
    let mut out = String::new();
    if let Some(idea) = &session.selected_idea {
        out.push_str(&format!("{} {}\n", "Idea:".bright_cyan(), idea));
    }
    out.push_str(&format!("\n{}\n\n", draft));
    match &session.critique {
        Some(critique) => out.push_str(&format!("{}\n{}\n", "Reviewer feedback:".bright_yellow(), critique)),
        None => out.push_str(&format!("{}\n", "No reviewer feedback on this version.".dimmed())),
    }
    Ok(out)
}

fn print_help() {
    println!();
    println!("{}", "Available Commands:".bright_cyan());
    for (usage, description) in HELP {
        println!("  {:26} {}", usage.yellow(), description);
    }
    println!();
    println!("Anything else you type answers the current question.");
    println!();
}

fn print_new_messages(session: &Session, from: usize) {
    for msg in session.messages().iter().skip(from) {
        match msg.role {
            Role::User => println!("{} {}", "you:".bright_green(), msg.content),
            Role::Assistant => println!("{} {}", "ascent:".bright_blue(), msg.content),
        }
        println!();
    }
}

fn print_notices(outcome: &StepOutcome) {
    for notice in &outcome.notices {
        match notice {
            Notice::Info(msg) => println!("{} {}", "i".bright_blue(), msg),
            Notice::Warning(msg) => println!("{} {}", "!".yellow(), msg),
            Notice::Error(msg) => println!("{} {}", "x".red(), msg),
        }
    }
}

fn theme_name(session: &Session, position: usize) -> Result<String, IdeaError> {
    session
        .post_ideas
        .theme_names()
        .into_iter()
        .nth(position)
        .ok_or_else(|| IdeaError::UnknownTheme(format!("#{}", position + 1)))
}

/// One `/sessions` row: short id, title, stage and local creation time
fn session_line(session: &Session) -> String {
    format!(
        "{}  {}  {}  {}",
        session.id().short(),
        session.title.bright_white(),
        session.stage().to_string().dimmed(),
        session
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string()
            .dimmed()
    )
}

fn preview(text: &str, max: usize) -> String {
    let first = text.lines().next().unwrap_or_default();
    if first.chars().count() > max {
        format!("{}...", first.chars().take(max).collect::<String>())
    } else {
        first.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::mock::ScriptedGenerator;
    use crate::config::WorkflowConfig;
    use crate::prompts::{PromptLoader, TaskBuilder, TaskKind};
    use tempfile::TempDir;

    fn repl(dir: &TempDir) -> ReplSession<ScriptedGenerator> {
        let workflow = Workflow::new(
            ScriptedGenerator::new(),
            TaskBuilder::new(PromptLoader::embedded_only()),
            WorkflowConfig::default(),
        );
        ReplSession::new(workflow, dir.path().to_path_buf())
    }

    #[tokio::test]
    async fn test_new_session_is_active_and_started() {
        let dir = TempDir::new().unwrap();
        let mut repl = repl(&dir);
        repl.new_session().unwrap();
        let session = repl.store().active().unwrap();
        assert_eq!(session.stage(), Stage::AwaitingResumeChoice);
    }

    #[tokio::test]
    async fn test_skip_then_text_answers() {
        let dir = TempDir::new().unwrap();
        let mut repl = repl(&dir);
        repl.new_session().unwrap();
        repl.handle_command(ReplCommand::Skip).await.unwrap();
        repl.handle_text("Backend engineer of eight years").await.unwrap();
        assert_eq!(repl.store().active().unwrap().stage(), Stage::AwaitingTarget);
    }

    #[tokio::test]
    async fn test_delete_active_then_commands_fail_cleanly() {
        let dir = TempDir::new().unwrap();
        let mut repl = repl(&dir);
        repl.new_session().unwrap();
        let id = repl.store().active_id().unwrap().to_string();

        repl.handle_command(ReplCommand::Delete(id)).await.unwrap();
        assert!(repl.store().active_id().is_none());
        assert!(repl.handle_command(ReplCommand::Status).await.is_err());
        assert_eq!(repl.handle_command(ReplCommand::Quit).await.unwrap(), SlashResult::Quit);
    }

    #[tokio::test]
    async fn test_free_text_after_drafting_revises_draft() {
        let dir = TempDir::new().unwrap();
        let workflow = Workflow::new(
            ScriptedGenerator::new().respond(TaskKind::RefinePost, "Shorter post about mentoring"),
            TaskBuilder::new(PromptLoader::embedded_only()),
            WorkflowConfig::default(),
        );
        let mut repl = ReplSession::new(workflow, dir.path().to_path_buf());
        let id = repl.store.create();
        repl.store.set_active(&id).unwrap();
        let session = repl.store.get_mut(&id).unwrap();
        session.push_strategy("Monday: Leadership");
        session.push_draft("A long post about mentoring");
        session.selected_idea = Some("Mentoring juniors".to_string());
        session.set_stage(Stage::PostDrafted);

        repl.handle_text("make it shorter").await.unwrap();
        let session = repl.store().active().unwrap();
        assert_eq!(session.stage(), Stage::PostDrafted);
        let view = draft_view(session).unwrap();
        assert!(view.contains("Shorter post about mentoring"));
        assert!(view.contains("Mentoring juniors"));
    }

    #[test]
    fn test_session_line_shows_creation_date() {
        let session = Session::new();
        let line = session_line(&session);
        let created = session.created_at.with_timezone(&Local).format("%Y-%m-%d").to_string();
        assert!(line.contains(&created));
        assert!(line.contains(session.id().short()));
    }

    #[tokio::test]
    async fn test_export_without_strategy_is_error() {
        let dir = TempDir::new().unwrap();
        let mut repl = repl(&dir);
        repl.new_session().unwrap();
        assert!(
            repl.handle_command(ReplCommand::Export(ExportTarget::Strategy))
                .await
                .is_err()
        );
    }
}
