//! Conversation workflow
//!
//! Drives a [`Session`] through the [`Stage`]s of onboarding, strategy
//! generation, ideation and drafting. Every stage change goes through the
//! transition table in [`stage`]; generation is delegated to a [`Generator`].
//!
//! Failure policy:
//! - validation problems become [`Notice::Warning`]s and the stage holds
//! - generation failures in the drafting stage roll back to `strategy_approved`
//! - other generation failures propagate as [`WorkflowError`] and the stage holds

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::agents::{AgentRole, Generator, InvocationError, RetryPolicy};
use crate::config::WorkflowConfig;
use crate::ideas::IdeaError;
use crate::prompts::{PromptError, StrategyInputs, TaskBuilder};
use crate::session::{ContextField, Session};

mod conversation;
mod drafts;
mod ideas;
mod input;
mod stage;

pub use ideas::RegenScope;
pub use input::{APPROVAL_TOKENS, Input, ResumeChoice, is_approval, parse_weeks};
pub use stage::Stage;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: Stage, to: Stage },

    #[error("Stage {stage} does not accept {input} input")]
    UnexpectedInput { stage: Stage, input: &'static str },

    #[error("'{op}' is not available in stage {stage}")]
    NotAvailable { op: &'static str, stage: Stage },

    #[error("No strategy version {0}")]
    UnknownStrategyVersion(u32),

    #[error("No draft history entry {0}")]
    UnknownDraftVersion(usize),

    #[error("No strategy has been generated yet")]
    NoStrategy,

    #[error("No draft to work on")]
    NoDraft,

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Idea(#[from] IdeaError),
}

/// Something to show the user alongside the updated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Warning(String),
    Error(String),
}

/// Result of one pass through the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub stage: Stage,
    pub notices: Vec<Notice>,
}

impl StepOutcome {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            notices: Vec::new(),
        }
    }

    pub fn with(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.notices.iter().filter_map(|n| match n {
            Notice::Warning(w) => Some(w.as_str()),
            _ => None,
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.notices.iter().filter_map(|n| match n {
            Notice::Error(e) => Some(e.as_str()),
            _ => None,
        })
    }
}

/// The conversation state machine
pub struct Workflow<G: Generator> {
    generator: G,
    tasks: TaskBuilder,
    settings: WorkflowConfig,
    retry: RetryPolicy,
}

impl<G: Generator> Workflow<G> {
    pub fn new(generator: G, tasks: TaskBuilder, settings: WorkflowConfig) -> Self {
        let retry = RetryPolicy::from(&settings.strategy_retry);
        debug!(?retry, "Workflow::new: called");
        Self {
            generator,
            tasks,
            settings,
            retry,
        }
    }

    /// Override the strategy retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn settings(&self) -> &WorkflowConfig {
        &self.settings
    }

    /// Move a freshly created session to its first question
    pub fn begin(&self, session: &mut Session) -> Result<StepOutcome, WorkflowError> {
        debug!(id = %session.id(), "Workflow::begin: called");
        transition(session, Stage::AwaitingResumeChoice)?;
        Ok(StepOutcome::new(session.stage()))
    }

    /// Onboarding answers as task inputs, with defaults filled in
    pub(crate) fn strategy_inputs(&self, session: &Session) -> StrategyInputs {
        let field = |f: ContextField| session.context(f).unwrap_or_default().to_string();
        let platform = session
            .context(ContextField::Platform)
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(self.settings.default_platform.as_str())
            .to_string();
        StrategyInputs {
            user_context: field(ContextField::UserContext),
            target_role: field(ContextField::TargetRole),
            target_audience: field(ContextField::TargetAudience),
            positioning: field(ContextField::Positioning),
            platform,
            duration: session
                .context(ContextField::Duration)
                .and_then(parse_weeks)
                .unwrap_or(self.settings.min_weeks),
            writing_samples: field(ContextField::WritingSamples),
        }
    }

    /// Replace the placeholder title from a body of text
    ///
    /// Failure is logged and leaves the title unchanged.
    pub(crate) async fn derive_title(&self, session: &mut Session, text: &str) -> Option<Notice> {
        debug!(id = %session.id(), "Workflow::derive_title: called");
        let task = match self.tasks.title(text) {
            Ok(task) => task,
            Err(e) => {
                warn!(error = %e, "derive_title: could not build title task");
                return None;
            }
        };
        match self.generator.generate(&task, AgentRole::Titler).await {
            Ok(raw) => match normalize_title(&raw) {
                Some(title) => {
                    info!(id = %session.id(), %title, "Session renamed");
                    session.title = title.clone();
                    Some(Notice::Info(format!("Session renamed to: {}", title)))
                }
                None => {
                    warn!(%raw, "derive_title: generated title was blank");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "derive_title: title generation failed, keeping placeholder");
                None
            }
        }
    }

    fn require_idea_stage(session: &Session, op: &'static str) -> Result<(), WorkflowError> {
        if session.stage().allows_idea_ops() {
            Ok(())
        } else {
            Err(WorkflowError::NotAvailable {
                op,
                stage: session.stage(),
            })
        }
    }
}

/// Move a session along one edge of the transition table
pub(crate) fn transition(session: &mut Session, to: Stage) -> Result<(), WorkflowError> {
    let from = session.stage();
    if !from.can_transition(to) {
        warn!(%from, %to, "transition: rejected");
        return Err(WorkflowError::InvalidTransition { from, to });
    }
    if from != to {
        info!(id = %session.id(), %from, %to, "Stage transition");
    }
    session.set_stage(to);
    Ok(())
}

/// Transition and ask the next stage's question
pub(crate) fn advance(session: &mut Session, to: Stage) -> Result<(), WorkflowError> {
    transition(session, to)?;
    if let Some(prompt) = to.prompt() {
        session.push_assistant(prompt);
    }
    Ok(())
}

/// Clean a generated title: first non-blank line, no quotes or markup
pub fn normalize_title(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line.strip_prefix("Title:").or_else(|| line.strip_prefix("title:")).unwrap_or(line);
    let title = line
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '*' | '#' | '`'))
        .trim_end_matches('.')
        .trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}
