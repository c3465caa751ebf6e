//! Drafting a post from an idea, and editing the result

use tracing::{debug, error, info};

use super::{Notice, Stage, StepOutcome, Workflow, WorkflowError, transition};
use crate::agents::{AgentRole, Generator};
use crate::session::Session;

impl<G: Generator> Workflow<G> {
    /// Draft a post from an idea on the board and have it reviewed
    ///
    /// Any failure while drafting returns the session to `strategy_approved`
    /// with no idea selected; the error is reported as a notice.
    pub async fn select_idea(&self, session: &mut Session, theme: &str, index: usize) -> Result<StepOutcome, WorkflowError> {
        Self::require_idea_stage(session, "write post")?;
        let idea = session.post_ideas.get(theme, index)?.text.clone();
        debug!(id = %session.id(), %theme, index, "Workflow::select_idea: called");

        session.selected_idea = Some(idea.clone());
        transition(session, Stage::DraftingPost)?;

        match self.draft_and_review(session, &idea).await {
            Ok((draft, critique)) => {
                session.push_draft(draft);
                session.critique = Some(critique);
                transition(session, Stage::PostDrafted)?;
                info!(id = %session.id(), "Post drafted");
                Ok(StepOutcome::new(session.stage()))
            }
            Err(e) => {
                error!(id = %session.id(), error = %e, "select_idea: drafting failed, rolling back");
                session.selected_idea = None;
                transition(session, Stage::StrategyApproved)?;
                Ok(StepOutcome::new(session.stage()).with(Notice::Error(format!("Drafting failed: {}", e))))
            }
        }
    }

    async fn draft_and_review(&self, session: &Session, idea: &str) -> Result<(String, String), WorkflowError> {
        let inputs = self.strategy_inputs(session);
        let task = self.tasks.draft_post(idea, &inputs)?;
        let draft = self.generator.generate(&task, AgentRole::Ghostwriter).await?;
        let task = self.tasks.qa_review(idea, &draft)?;
        let critique = self.generator.generate(&task, AgentRole::Reviewer).await?;
        Ok((draft, critique))
    }

    /// Revise the current draft from feedback; the critique is cleared
    pub async fn refine_draft(&self, session: &mut Session, feedback: &str) -> Result<StepOutcome, WorkflowError> {
        require_drafted(session, "refine draft")?;
        let feedback = feedback.trim();
        if feedback.is_empty() {
            return Ok(StepOutcome::new(session.stage())
                .with(Notice::Warning("Tell me what to change in the draft.".to_string())));
        }
        let draft = session.draft.clone().ok_or(WorkflowError::NoDraft)?;
        debug!(id = %session.id(), "Workflow::refine_draft: called");

        let task = self.tasks.refine_post(&draft, feedback)?;
        let revised = self.generator.generate(&task, AgentRole::Ghostwriter).await?;
        session.push_draft(revised);
        session.critique = None;
        transition(session, Stage::PostDrafted)?;
        Ok(StepOutcome::new(session.stage()))
    }

    /// Ask the reviewer for a fresh critique of the current draft
    pub async fn review_draft(&self, session: &mut Session) -> Result<StepOutcome, WorkflowError> {
        require_drafted(session, "review draft")?;
        let draft = session.draft.clone().ok_or(WorkflowError::NoDraft)?;
        let idea = session.selected_idea.clone().unwrap_or_default();
        let task = self.tasks.qa_review(&idea, &draft)?;
        let critique = self.generator.generate(&task, AgentRole::Reviewer).await?;
        session.critique = Some(critique);
        Ok(StepOutcome::new(session.stage()))
    }

    /// Replace the current draft text in place; history is untouched
    pub fn edit_draft(&self, session: &mut Session, text: &str) -> Result<StepOutcome, WorkflowError> {
        require_drafted(session, "edit draft")?;
        if session.draft.is_none() {
            return Err(WorkflowError::NoDraft);
        }
        session.draft = Some(text.to_string());
        Ok(StepOutcome::new(session.stage()))
    }

    /// Make a history entry the current draft again
    pub fn restore_draft(&self, session: &mut Session, index: usize) -> Result<StepOutcome, WorkflowError> {
        let content = session
            .draft_history()
            .get(index)
            .map(|v| v.content.clone())
            .ok_or(WorkflowError::UnknownDraftVersion(index))?;
        debug!(id = %session.id(), index, "Workflow::restore_draft: called");
        session.draft = Some(content);
        Ok(StepOutcome::new(session.stage()).with(Notice::Info(format!("Restored draft {}", index + 1))))
    }
}

fn require_drafted(session: &Session, op: &'static str) -> Result<(), WorkflowError> {
    if session.stage() == Stage::PostDrafted {
        Ok(())
    } else {
        Err(WorkflowError::NotAvailable {
            op,
            stage: session.stage(),
        })
    }
}
