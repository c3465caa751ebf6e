//! Idea board operations, open in `strategy_approved` and `post_drafted`

use tracing::{debug, info};

use super::{Notice, StepOutcome, Workflow, WorkflowError};
use crate::agents::{AgentRole, Generator};
use crate::ideas::{Idea, IdeaError, parse_ideas};
use crate::session::Session;

/// Which themes a regeneration touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegenScope {
    Theme(String),
    All,
}

impl<G: Generator> Workflow<G> {
    /// Flip an idea's checked flag; returns the new value
    pub fn toggle_idea(&self, session: &mut Session, theme: &str, index: usize) -> Result<bool, WorkflowError> {
        Self::require_idea_stage(session, "toggle idea")?;
        Ok(session.post_ideas.toggle(theme, index)?)
    }

    /// Move an idea to the end of another theme, creating it if needed
    pub fn move_idea(&self, session: &mut Session, theme: &str, index: usize, to: &str) -> Result<(), WorkflowError> {
        Self::require_idea_stage(session, "move idea")?;
        let to = to.trim();
        if to.is_empty() {
            return Err(IdeaError::UnknownTheme(to.to_string()).into());
        }
        session.post_ideas.move_idea(theme, index, to)?;
        Ok(())
    }

    /// Add a hand-written idea, unchecked
    pub fn add_idea(&self, session: &mut Session, theme: &str, text: &str) -> Result<StepOutcome, WorkflowError> {
        Self::require_idea_stage(session, "add idea")?;
        let (theme, text) = (theme.trim(), text.trim());
        if theme.is_empty() || text.is_empty() {
            return Ok(StepOutcome::new(session.stage())
                .with(Notice::Warning("An idea needs both a theme and some text.".to_string())));
        }
        session.post_ideas.push(theme, Idea::new(text, false));
        Ok(StepOutcome::new(session.stage()))
    }

    /// Rewrite the checked ideas according to a critique
    ///
    /// The checked ideas are replaced by the rewritten ones, unchecked.
    pub async fn refine_ideas(&self, session: &mut Session, critique: &str) -> Result<StepOutcome, WorkflowError> {
        Self::require_idea_stage(session, "refine ideas")?;
        let selected = session.post_ideas.checked();
        debug!(id = %session.id(), selected = selected.len(), "Workflow::refine_ideas: called");
        if selected.is_empty() {
            return Ok(StepOutcome::new(session.stage())
                .with(Notice::Warning("Check at least one idea to refine.".to_string())));
        }
        if critique.trim().is_empty() {
            return Ok(StepOutcome::new(session.stage())
                .with(Notice::Warning("Tell me how the selected ideas should change.".to_string())));
        }

        let task = self.tasks.refine_ideas(&selected, critique.trim())?;
        let raw = self.generator.generate(&task, AgentRole::Ideator).await?;
        let refined = parse_ideas(&raw, false);
        if refined.is_empty() {
            return Ok(StepOutcome::new(session.stage())
                .with(Notice::Warning("The refined ideas could not be read; nothing was changed.".to_string())));
        }

        info!(id = %session.id(), replaced = selected.len(), added = refined.len(), "Refined ideas");
        session.post_ideas.remove_checked();
        session.post_ideas.merge(refined);
        Ok(StepOutcome::new(session.stage()))
    }

    /// Replace the unchecked ideas of one theme or of every theme
    ///
    /// Each theme is asked for as many new ideas as it had unchecked ones;
    /// checked ideas stay in place. The board changes only once every
    /// theme's generation has succeeded.
    pub async fn regenerate_ideas(&self, session: &mut Session, scope: RegenScope) -> Result<StepOutcome, WorkflowError> {
        Self::require_idea_stage(session, "regenerate ideas")?;
        let strategy = session.current_strategy().ok_or(WorkflowError::NoStrategy)?.content.clone();
        let themes = match scope {
            RegenScope::Theme(theme) => {
                if session.post_ideas.ideas(&theme).is_none() {
                    return Err(IdeaError::UnknownTheme(theme).into());
                }
                vec![theme]
            }
            RegenScope::All => session.post_ideas.theme_names(),
        };
        debug!(id = %session.id(), themes = themes.len(), "Workflow::regenerate_ideas: called");

        let mut outcome = StepOutcome::new(session.stage());
        let mut replacements = Vec::new();
        for theme in themes {
            let ideas = session.post_ideas.ideas(&theme).unwrap_or_default();
            let (keep, replaced): (Vec<Idea>, Vec<Idea>) = ideas.iter().cloned().partition(|idea| idea.checked);
            if replaced.is_empty() {
                continue;
            }
            let task = self
                .tasks
                .regenerate_ideas(&theme, replaced.len(), &strategy, &keep, &replaced)?;
            let raw = self.generator.generate(&task, AgentRole::Ideator).await?;
            let fresh = parse_ideas(&raw, false);
            if fresh.is_empty() {
                outcome = outcome.with(Notice::Warning(format!(
                    "No new ideas could be read for '{}'; kept the old ones.",
                    theme
                )));
                continue;
            }
            replacements.push((theme, fresh));
        }
        if replacements.is_empty() && outcome.notices.is_empty() {
            outcome = outcome.with(Notice::Warning("Every idea is checked; uncheck the ones to replace.".to_string()));
        }
        info!(id = %session.id(), themes = replacements.len(), "Regenerated ideas");
        for (theme, fresh) in replacements {
            session.post_ideas.remove_unchecked(&theme);
            session.post_ideas.merge_into(&theme, fresh);
        }
        Ok(outcome)
    }

    /// More ideas in the spirit of one exemplar, added to its theme
    pub async fn similar_ideas(&self, session: &mut Session, theme: &str, index: usize) -> Result<StepOutcome, WorkflowError> {
        Self::require_idea_stage(session, "similar ideas")?;
        let exemplar = session.post_ideas.get(theme, index)?.text.clone();
        debug!(id = %session.id(), %theme, index, "Workflow::similar_ideas: called");

        let task = self
            .tasks
            .similar_ideas(theme, &exemplar, self.settings.ideas_per_theme)?;
        let raw = self.generator.generate(&task, AgentRole::Ideator).await?;
        let fresh = parse_ideas(&raw, false);
        if fresh.is_empty() {
            return Ok(StepOutcome::new(session.stage())
                .with(Notice::Warning("No similar ideas could be read from the output.".to_string())));
        }
        session.post_ideas.merge_into(theme, fresh);
        Ok(StepOutcome::new(session.stage()))
    }

    /// Run ideation again on the current strategy and add the results
    pub async fn more_ideas(&self, session: &mut Session) -> Result<StepOutcome, WorkflowError> {
        Self::require_idea_stage(session, "more ideas")?;
        let strategy = session.current_strategy().ok_or(WorkflowError::NoStrategy)?.content.clone();
        let task = self.tasks.ideation(&strategy, self.settings.ideas_per_theme)?;
        let raw = self.generator.generate(&task, AgentRole::Ideator).await?;
        let fresh = parse_ideas(&raw, false);
        if fresh.is_empty() {
            return Ok(StepOutcome::new(session.stage())
                .with(Notice::Warning("No post ideas could be read from the output.".to_string())));
        }
        session.post_ideas.merge(fresh);
        Ok(StepOutcome::new(session.stage()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::Stage;
    use super::*;
    use crate::agents::mock::ScriptedGenerator;
    use crate::ideas::IdeaBoard;
    use crate::prompts::TaskKind;

    fn approved(board: &str) -> Session {
        let mut session = session_at(Stage::StrategyApproved);
        session.push_strategy("Monday: Leadership\nFriday: AI Trends");
        session.post_ideas = parse_ideas(board, false);
        session
    }

    const BOARD: &str = "THEME: Leadership\n- Failed project lesson\n- Mentoring juniors\nTHEME: AI Trends\n- Industry report\n";

    #[test]
    fn test_ops_rejected_before_approval() {
        let wf = workflow(ScriptedGenerator::new());
        let mut session = approved(BOARD);
        session.set_stage(Stage::AwaitingRefinement);
        let err = wf.toggle_idea(&mut session, "Leadership", 0).unwrap_err();
        assert!(matches!(err, WorkflowError::NotAvailable { .. }));
    }

    #[test]
    fn test_toggle_and_move() {
        let wf = workflow(ScriptedGenerator::new());
        let mut session = approved(BOARD);
        assert!(wf.toggle_idea(&mut session, "Leadership", 1).unwrap());
        wf.move_idea(&mut session, "Leadership", 1, "Mentorship").unwrap();

        assert_eq!(session.post_ideas.ideas("Leadership").unwrap().len(), 1);
        assert_eq!(
            session.post_ideas.ideas("Mentorship").unwrap(),
            &[Idea::new("Mentoring juniors", true)]
        );
        assert!(wf.move_idea(&mut session, "Leadership", 5, "X").is_err());
        assert_eq!(session.post_ideas.len(), 3);
    }

    #[test]
    fn test_add_idea() {
        let wf = workflow(ScriptedGenerator::new());
        let mut session = approved(BOARD);
        wf.add_idea(&mut session, "AI Trends", "My take on agents").unwrap();
        assert_eq!(session.post_ideas.ideas("AI Trends").unwrap()[1].text, "My take on agents");
        let outcome = wf.add_idea(&mut session, "AI Trends", " ").unwrap();
        assert_eq!(outcome.warnings().count(), 1);
    }

    #[tokio::test]
    async fn test_refine_checked_ideas() {
        let generator = ScriptedGenerator::new().respond(
            TaskKind::RefineIdeas,
            "THEME: Leadership\n- The project that failed and what I changed\n",
        );
        let wf = workflow(generator);
        let mut session = approved(BOARD);
        wf.toggle_idea(&mut session, "Leadership", 0).unwrap();

        wf.refine_ideas(&mut session, "more concrete").await.unwrap();
        let leadership = session.post_ideas.ideas("Leadership").unwrap();
        assert_eq!(
            leadership,
            &[
                Idea::new("Mentoring juniors", false),
                Idea::new("The project that failed and what I changed", false)
            ]
        );
        let calls = wf.generator().calls();
        assert!(calls[0].2.contains("- Failed project lesson"));
        assert!(!calls[0].2.contains("Mentoring juniors"));
    }

    #[tokio::test]
    async fn test_refine_without_selection_warns() {
        let wf = workflow(ScriptedGenerator::new());
        let mut session = approved(BOARD);
        let outcome = wf.refine_ideas(&mut session, "punchier").await.unwrap();
        assert_eq!(outcome.warnings().count(), 1);
        assert!(wf.generator().calls().is_empty());
    }

    #[tokio::test]
    async fn test_regenerate_single_theme_keeps_checked() {
        let generator = ScriptedGenerator::new().respond(
            TaskKind::RegenerateIdeas,
            "THEME: Leadership\n- Hiring my first report\n",
        );
        let wf = workflow(generator);
        let mut session = approved(BOARD);
        wf.toggle_idea(&mut session, "Leadership", 0).unwrap();

        wf.regenerate_ideas(&mut session, RegenScope::Theme("Leadership".to_string()))
            .await
            .unwrap();
        assert_eq!(
            session.post_ideas.ideas("Leadership").unwrap(),
            &[
                Idea::new("Failed project lesson", true),
                Idea::new("Hiring my first report", false)
            ]
        );
        assert_eq!(session.post_ideas.ideas("AI Trends").unwrap().len(), 1);
        let calls = wf.generator().calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].2.contains("Write 1 fresh post ideas"));
    }

    #[tokio::test]
    async fn test_regenerate_all_themes() {
        let generator = ScriptedGenerator::new()
            .respond(TaskKind::RegenerateIdeas, "THEME: AI Trends\n- Agents in 2025\n")
            .respond(TaskKind::RegenerateIdeas, "THEME: Leadership\n- One\n- Two\n");
        let wf = workflow(generator);
        let mut session = approved(BOARD);

        wf.regenerate_ideas(&mut session, RegenScope::All).await.unwrap();
        assert_eq!(session.post_ideas.ideas("AI Trends").unwrap(), &[Idea::new("Agents in 2025", false)]);
        assert_eq!(
            session.post_ideas.ideas("Leadership").unwrap(),
            &[Idea::new("One", false), Idea::new("Two", false)]
        );
        assert_eq!(wf.generator().calls_of(TaskKind::RegenerateIdeas), 2);
    }

    #[tokio::test]
    async fn test_regenerate_all_is_all_or_nothing() {
        let generator = ScriptedGenerator::new()
            .respond(TaskKind::RegenerateIdeas, "THEME: AI Trends\n- Fresh AI idea\n")
            .fail(TaskKind::RegenerateIdeas);
        let wf = workflow(generator);
        let mut session = approved(BOARD);
        let before = session.post_ideas.clone();

        assert!(wf.regenerate_ideas(&mut session, RegenScope::All).await.is_err());
        assert_eq!(wf.generator().calls_of(TaskKind::RegenerateIdeas), 2);
        assert_eq!(session.post_ideas, before);
        assert_eq!(session.stage(), Stage::StrategyApproved);
    }

    #[tokio::test]
    async fn test_regenerate_unknown_theme() {
        let wf = workflow(ScriptedGenerator::new());
        let mut session = approved(BOARD);
        let err = wf
            .regenerate_ideas(&mut session, RegenScope::Theme("Nope".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Idea(IdeaError::UnknownTheme(_))));
    }

    #[tokio::test]
    async fn test_regenerate_with_everything_checked_warns() {
        let wf = workflow(ScriptedGenerator::new());
        let mut session = approved("THEME: Solo\n- Only idea\n");
        wf.toggle_idea(&mut session, "Solo", 0).unwrap();
        let outcome = wf.regenerate_ideas(&mut session, RegenScope::All).await.unwrap();
        assert_eq!(outcome.warnings().count(), 1);
        assert!(wf.generator().calls().is_empty());
    }

    #[tokio::test]
    async fn test_similar_ideas_append_to_theme() {
        let generator = ScriptedGenerator::new().respond(
            TaskKind::SimilarIdeas,
            "THEME: Something Else\n- Report on hiring trends\n- Salary data deep dive\n",
        );
        let wf = workflow(generator);
        let mut session = approved(BOARD);
        wf.similar_ideas(&mut session, "AI Trends", 0).await.unwrap();

        let trends = session.post_ideas.ideas("AI Trends").unwrap();
        assert_eq!(trends.len(), 3);
        assert_eq!(trends[2].text, "Salary data deep dive");
        assert!(session.post_ideas.ideas("Something Else").is_none());
    }

    #[tokio::test]
    async fn test_more_ideas_merges() {
        let generator = ScriptedGenerator::new().respond(TaskKind::Ideation, "THEME: Leadership\n- Brand new\n");
        let wf = workflow(generator);
        let mut session = approved(BOARD);
        wf.more_ideas(&mut session).await.unwrap();
        assert_eq!(session.post_ideas.ideas("Leadership").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failure_leaves_board_untouched() {
        let wf = workflow(ScriptedGenerator::new());
        let mut session = approved(BOARD);
        let before: IdeaBoard = session.post_ideas.clone();
        assert!(wf.more_ideas(&mut session).await.is_err());
        assert_eq!(session.post_ideas, before);
        assert_eq!(session.stage(), Stage::StrategyApproved);
    }
}
