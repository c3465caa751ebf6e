//! Chat-style stage handlers: onboarding, outline and strategy

use tracing::{debug, warn};

use super::{Input, Notice, ResumeChoice, Stage, StepOutcome, Workflow, WorkflowError, advance, is_approval, parse_weeks, transition};
use crate::agents::{AgentRole, Generator, generate_with_retry};
use crate::extract::{BatchExtraction, UploadedDocument, extract_batch};
use crate::ideas::parse_ideas;
use crate::session::{ContextField, PLACEHOLDER_TITLE, Session, StrategyVersion};

impl<G: Generator> Workflow<G> {
    /// Feed one input to the session's current stage
    pub async fn step(&self, session: &mut Session, input: Input) -> Result<StepOutcome, WorkflowError> {
        let stage = session.stage();
        debug!(id = %session.id(), %stage, input = input.kind(), "Workflow::step: called");
        match (stage, input) {
            (Stage::AwaitingResumeChoice, Input::ResumeChoice(choice)) => self.on_resume_choice(session, choice),
            (Stage::AwaitingResumeChoice, Input::Text(text)) => match ResumeChoice::parse(&text) {
                Some(choice) => self.on_resume_choice(session, choice),
                None => Ok(hold(session, "Please choose to upload your resume or skip and describe yourself.")),
            },
            (Stage::AwaitingResumeUpload, Input::Documents(docs)) => self.on_resume_upload(session, &docs).await,
            (Stage::AwaitingIntro, Input::Text(text)) => {
                on_answer(session, ContextField::UserContext, &text, Stage::AwaitingTarget)
            }
            (Stage::AwaitingConfirmation, Input::Text(text)) => on_confirmation(session, &text),
            (Stage::AwaitingTarget, Input::Text(text)) => {
                on_answer(session, ContextField::TargetRole, &text, Stage::AwaitingAudience)
            }
            (Stage::AwaitingAudience, Input::Text(text)) => {
                on_answer(session, ContextField::TargetAudience, &text, Stage::AwaitingPositioning)
            }
            (Stage::AwaitingPositioning, Input::Text(text)) => {
                on_answer(session, ContextField::Positioning, &text, Stage::AwaitingSamples)
            }
            (Stage::AwaitingSamples, Input::Text(text)) => {
                on_answer(session, ContextField::WritingSamples, &text, Stage::AwaitingDuration)
            }
            (Stage::AwaitingSamples, Input::Documents(docs)) => on_sample_upload(session, &docs),
            (Stage::AwaitingSamples, Input::SkipSamples) => {
                session.push_user("I'll skip the writing samples.");
                advance(session, Stage::AwaitingDuration)?;
                Ok(StepOutcome::new(session.stage()))
            }
            (Stage::AwaitingDuration, Input::Text(text)) => self.on_duration(session, &text).await,
            (Stage::GeneratingStrategy, Input::Retry) => self.generate_outline(session, None).await,
            (Stage::AwaitingOutlineApproval, Input::Text(text)) => self.on_outline_reply(session, &text).await,
            (Stage::AwaitingRefinement, Input::Text(text)) => self.on_strategy_reply(session, &text).await,
            (Stage::PostDrafted, Input::Text(text)) => self.refine_draft(session, &text).await,
            (stage, input) => Err(WorkflowError::UnexpectedInput {
                stage,
                input: input.kind(),
            }),
        }
    }

    /// Set the target platform; used by every later generation
    pub fn set_platform(&self, session: &mut Session, platform: &str) -> StepOutcome {
        let platform = platform.trim();
        if platform.is_empty() {
            return hold(session, "Please name a platform, e.g. LinkedIn.");
        }
        debug!(id = %session.id(), %platform, "Workflow::set_platform: called");
        session.set_context(ContextField::Platform, platform);
        StepOutcome::new(session.stage()).with(Notice::Info(format!("Platform set to {}", platform)))
    }

    /// Look up a strategy by version number
    pub fn strategy_version<'a>(&self, session: &'a Session, version: u32) -> Result<&'a StrategyVersion, WorkflowError> {
        session
            .strategy_version(version)
            .ok_or(WorkflowError::UnknownStrategyVersion(version))
    }

    fn on_resume_choice(&self, session: &mut Session, choice: ResumeChoice) -> Result<StepOutcome, WorkflowError> {
        match choice {
            ResumeChoice::Upload => {
                session.push_user("I'll upload my resume.");
                advance(session, Stage::AwaitingResumeUpload)?;
            }
            ResumeChoice::Skip => {
                session.push_user("I'll skip and describe myself.");
                advance(session, Stage::AwaitingIntro)?;
            }
        }
        Ok(StepOutcome::new(session.stage()))
    }

    async fn on_resume_upload(
        &self,
        session: &mut Session,
        docs: &[UploadedDocument],
    ) -> Result<StepOutcome, WorkflowError> {
        let batch = extract_batch(docs);
        let mut outcome = failure_notices(session.stage(), &batch);
        if batch.is_empty() {
            warn!(id = %session.id(), "on_resume_upload: no text extracted");
            return Ok(outcome.with(Notice::Warning(
                "None of the uploaded files contained readable text. Please try another file.".to_string(),
            )));
        }

        let text = batch.text.trim().to_string();
        let task = self.tasks.summarize_resume(&text)?;
        let summary = self.generator.generate(&task, AgentRole::Summarizer).await?;

        session.push_user(format!("Uploaded {}", document_names(docs)));
        session.set_context(ContextField::UserContext, text);
        session.push_assistant(summary);
        transition(session, Stage::AwaitingConfirmation)?;
        outcome.stage = session.stage();
        Ok(outcome)
    }

    async fn on_duration(&self, session: &mut Session, text: &str) -> Result<StepOutcome, WorkflowError> {
        let (min, max) = (self.settings.min_weeks, self.settings.max_weeks);
        let weeks = match parse_weeks(text) {
            Some(weeks) if (min..=max).contains(&weeks) => weeks,
            _ => {
                return Ok(hold(
                    session,
                    &format!("Please enter a number of weeks between {} and {}.", min, max),
                ));
            }
        };

        session.push_user(text.trim());
        session.set_context(ContextField::Duration, weeks.to_string());
        if session.context(ContextField::Platform).is_none() {
            session.set_context(ContextField::Platform, self.settings.default_platform.clone());
        }
        transition(session, Stage::GeneratingStrategy)?;
        session.push_assistant("Perfect, I have everything I need. The Strategist is now outlining your plan.");
        self.generate_outline(session, None).await
    }

    async fn on_outline_reply(&self, session: &mut Session, text: &str) -> Result<StepOutcome, WorkflowError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(hold(session, "Approve the outline or tell me what to change."));
        }
        session.push_user(text);
        if is_approval(text) {
            self.generate_strategy(session).await
        } else {
            self.generate_outline(session, Some(text)).await
        }
    }

    async fn on_strategy_reply(&self, session: &mut Session, text: &str) -> Result<StepOutcome, WorkflowError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(hold(session, "Provide feedback or type 'looks good' to approve."));
        }
        session.push_user(text);
        let previous = session.current_strategy().ok_or(WorkflowError::NoStrategy)?.content.clone();

        if is_approval(text) {
            let task = self.tasks.ideation(&previous, self.settings.ideas_per_theme)?;
            let raw = self.generator.generate(&task, AgentRole::Ideator).await?;
            let board = parse_ideas(&raw, false);
            let mut outcome = StepOutcome::new(Stage::StrategyApproved);
            if board.is_empty() {
                warn!(id = %session.id(), "on_strategy_reply: ideation produced no parsable ideas");
                outcome = outcome.with(Notice::Warning(
                    "No post ideas could be read from the ideator's output. Ask for more ideas to try again."
                        .to_string(),
                ));
            }
            session.post_ideas = board;
            transition(session, Stage::StrategyApproved)?;
            session.push_assistant(
                "Great! The strategy is finalized and I've generated some initial post ideas. Pick one to write, \
                 or refine them first.",
            );
            Ok(outcome)
        } else {
            let inputs = self.strategy_inputs(session);
            let task = self.tasks.refine_strategy(&inputs, &previous, text)?;
            let refined = self.generator.generate(&task, AgentRole::Strategist).await?;
            let version = session.push_strategy(refined.clone());
            session.push_assistant(format!(
                "I've updated the strategy based on your feedback (version {}):\n\n---\n\n{}\n\n---\n\nHow does this \
                 new version look?",
                version, refined
            ));
            transition(session, Stage::AwaitingRefinement)?;
            Ok(StepOutcome::new(session.stage()))
        }
    }

    async fn generate_outline(&self, session: &mut Session, feedback: Option<&str>) -> Result<StepOutcome, WorkflowError> {
        debug!(id = %session.id(), has_feedback = feedback.is_some(), "Workflow::generate_outline: called");
        let inputs = self.strategy_inputs(session);
        let task = self.tasks.outline(&inputs, session.outline.as_deref(), feedback)?;
        let outline = generate_with_retry(&self.generator, &task, AgentRole::Strategist, self.retry).await?;

        session.outline = Some(outline.clone());
        session.push_assistant(format!(
            "Here is an outline of your {}-week plan:\n\n---\n\n{}\n\n---\n\n{}",
            inputs.duration,
            outline,
            Stage::AwaitingOutlineApproval.prompt().unwrap_or_default()
        ));
        transition(session, Stage::AwaitingOutlineApproval)?;
        Ok(StepOutcome::new(session.stage()))
    }

    async fn generate_strategy(&self, session: &mut Session) -> Result<StepOutcome, WorkflowError> {
        debug!(id = %session.id(), "Workflow::generate_strategy: called");
        let inputs = self.strategy_inputs(session);
        let outline = session.outline.clone().unwrap_or_default();
        let task = self.tasks.strategy(&inputs, &outline)?;
        let strategy = generate_with_retry(&self.generator, &task, AgentRole::Strategist, self.retry).await?;

        session.push_strategy(strategy.clone());
        let mut outcome = StepOutcome::new(Stage::AwaitingRefinement);
        if session.title == PLACEHOLDER_TITLE
            && let Some(notice) = self.derive_title(session, &strategy).await
        {
            outcome = outcome.with(notice);
        }
        session.push_assistant(format!(
            "Here is the initial brand strategy I've developed for you:\n\n---\n\n{}\n\n---\n\nDoes this feel like the \
             right direction? Please provide feedback for refinement, or type 'looks good' to approve.",
            strategy
        ));
        transition(session, Stage::AwaitingRefinement)?;
        Ok(outcome)
    }
}

fn on_answer(session: &mut Session, field: ContextField, text: &str, next: Stage) -> Result<StepOutcome, WorkflowError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(hold(session, "Please enter an answer to continue."));
    }
    session.push_user(text);
    session.set_context(field, text);
    advance(session, next)?;
    Ok(StepOutcome::new(session.stage()))
}

fn on_confirmation(session: &mut Session, text: &str) -> Result<StepOutcome, WorkflowError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(hold(session, "Let me know if the summary is right, or what to add."));
    }
    session.push_user(text);
    session.append_context(ContextField::UserContext, &format!("Additional User Notes:\n{}", text));
    advance(session, Stage::AwaitingTarget)?;
    Ok(StepOutcome::new(session.stage()))
}

fn on_sample_upload(session: &mut Session, docs: &[UploadedDocument]) -> Result<StepOutcome, WorkflowError> {
    let batch = extract_batch(docs);
    let mut outcome = failure_notices(session.stage(), &batch);
    if batch.is_empty() {
        return Ok(outcome.with(Notice::Warning(
            "None of the uploaded samples contained readable text. Paste them instead, or skip.".to_string(),
        )));
    }
    session.push_user(format!("Uploaded writing samples: {}", document_names(docs)));
    session.append_context(ContextField::WritingSamples, batch.text.trim());
    advance(session, Stage::AwaitingDuration)?;
    outcome.stage = session.stage();
    Ok(outcome)
}

/// Keep the stage and warn
fn hold(session: &Session, message: &str) -> StepOutcome {
    warn!(id = %session.id(), stage = %session.stage(), %message, "Input rejected, stage holds");
    StepOutcome::new(session.stage()).with(Notice::Warning(message.to_string()))
}

fn failure_notices(stage: Stage, batch: &BatchExtraction) -> StepOutcome {
    batch
        .failures
        .iter()
        .fold(StepOutcome::new(stage), |outcome, (name, e)| {
            outcome.with(Notice::Error(format!("Error processing file {}: {}", name, e)))
        })
}

fn document_names(docs: &[UploadedDocument]) -> String {
    docs.iter().map(|d| d.name.as_str()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::agents::mock::ScriptedGenerator;
    use crate::llm::Role;
    use crate::prompts::TaskKind;

    const OUTLINE: &str = "Week 1: Origins\nWeek 2: Lessons\nWeek 3: Tools\nWeek 4: Vision";
    const STRATEGY: &str = "## Week 1\nMonday: Career origin story\nThursday: Data to AI lessons";
    const IDEAS: &str = "THEME: Career origin story\n- Why I left pipelines for products\n- My first model in prod\n\
                         THEME: Data to AI lessons\n- Three habits that transfer\n";

    fn happy_generator() -> ScriptedGenerator {
        ScriptedGenerator::new()
            .respond(TaskKind::Outline, OUTLINE)
            .respond(TaskKind::Strategy, STRATEGY)
            .respond(TaskKind::Title, "Data To AI PM")
            .respond(TaskKind::Ideation, IDEAS)
    }

    async fn answer(wf: &Workflow<ScriptedGenerator>, session: &mut Session, text: &str) -> StepOutcome {
        wf.step(session, Input::text(text)).await.unwrap()
    }

    /// Start to awaiting_duration along the skip path
    async fn onboard(wf: &Workflow<ScriptedGenerator>, session: &mut Session) {
        wf.begin(session).unwrap();
        wf.step(session, Input::ResumeChoice(ResumeChoice::Skip)).await.unwrap();
        answer(wf, session, "Ten years in data engineering, moving into AI").await;
        answer(wf, session, "AI Product Manager").await;
        answer(wf, session, "Recruiters at FAANG companies").await;
        answer(wf, session, "approachable expert").await;
        wf.step(session, Input::SkipSamples).await.unwrap();
        assert_eq!(session.stage(), Stage::AwaitingDuration);
    }

    #[tokio::test]
    async fn test_skip_path_collects_context() {
        let wf = workflow(happy_generator());
        let mut session = Session::new();
        onboard(&wf, &mut session).await;

        assert_eq!(session.context(ContextField::UserContext), Some("Ten years in data engineering, moving into AI"));
        assert_eq!(session.context(ContextField::TargetRole), Some("AI Product Manager"));
        assert_eq!(session.context(ContextField::TargetAudience), Some("Recruiters at FAANG companies"));
        assert_eq!(session.context(ContextField::Positioning), Some("approachable expert"));
        assert_eq!(session.context(ContextField::WritingSamples), None);
        assert_eq!(
            session.messages().last().unwrap().content,
            Stage::AwaitingDuration.prompt().unwrap()
        );
        assert!(wf.generator().calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_answer_holds() {
        let wf = workflow(happy_generator());
        let mut session = Session::new();
        wf.begin(&mut session).unwrap();
        wf.step(&mut session, Input::ResumeChoice(ResumeChoice::Skip)).await.unwrap();
        let before = session.messages().len();

        let outcome = answer(&wf, &mut session, "   ").await;
        assert_eq!(outcome.stage, Stage::AwaitingIntro);
        assert_eq!(outcome.warnings().count(), 1);
        assert_eq!(session.messages().len(), before);
    }

    #[tokio::test]
    async fn test_resume_upload_path() {
        let wf = workflow(ScriptedGenerator::new().respond(
            TaskKind::SummarizeResume,
            "You are a senior data engineer. Did I get that right?",
        ));
        let mut session = Session::new();
        wf.begin(&mut session).unwrap();
        answer(&wf, &mut session, "upload").await;
        assert_eq!(session.stage(), Stage::AwaitingResumeUpload);

        let docs = vec![
            UploadedDocument::new("resume.md", "# Jane\nSenior data engineer"),
            UploadedDocument::new("photo.png", vec![0u8, 1, 2]),
        ];
        let outcome = wf.step(&mut session, Input::Documents(docs)).await.unwrap();
        assert_eq!(outcome.stage, Stage::AwaitingConfirmation);
        assert_eq!(outcome.errors().count(), 1);
        assert_eq!(session.context(ContextField::UserContext), Some("# Jane\nSenior data engineer"));
        assert!(session.messages().last().unwrap().content.starts_with("You are a senior data engineer"));

        answer(&wf, &mut session, "Also led a team of five").await;
        assert_eq!(session.stage(), Stage::AwaitingTarget);
        assert_eq!(
            session.context(ContextField::UserContext),
            Some("# Jane\nSenior data engineer\n\nAdditional User Notes:\nAlso led a team of five")
        );
    }

    #[tokio::test]
    async fn test_resume_upload_all_failures_hold() {
        let wf = workflow(ScriptedGenerator::new());
        let mut session = Session::new();
        wf.begin(&mut session).unwrap();
        wf.step(&mut session, Input::ResumeChoice(ResumeChoice::Upload)).await.unwrap();

        let docs = vec![UploadedDocument::new("broken.pdf", b"not a pdf".to_vec())];
        let outcome = wf.step(&mut session, Input::Documents(docs)).await.unwrap();
        assert_eq!(outcome.stage, Stage::AwaitingResumeUpload);
        assert_eq!(outcome.errors().count(), 1);
        assert_eq!(outcome.warnings().count(), 1);
        assert!(session.context(ContextField::UserContext).is_none());
        assert!(wf.generator().calls().is_empty());
    }

    #[tokio::test]
    async fn test_sample_documents_are_stored() {
        let wf = workflow(ScriptedGenerator::new());
        let mut session = session_at(Stage::AwaitingSamples);
        let docs = vec![UploadedDocument::new("post.txt", "Shipping beats perfection.")];
        let outcome = wf.step(&mut session, Input::Documents(docs)).await.unwrap();
        assert_eq!(outcome.stage, Stage::AwaitingDuration);
        assert_eq!(session.context(ContextField::WritingSamples), Some("Shipping beats perfection."));
    }

    #[tokio::test]
    async fn test_invalid_duration_holds() {
        let wf = workflow(happy_generator());
        let mut session = session_at(Stage::AwaitingDuration);
        for bad in ["a few weeks", "0", "53 weeks"] {
            let outcome = answer(&wf, &mut session, bad).await;
            assert_eq!(outcome.stage, Stage::AwaitingDuration, "{}", bad);
            assert_eq!(outcome.warnings().count(), 1);
        }
        assert!(wf.generator().calls().is_empty());
    }

    #[tokio::test]
    async fn test_duration_generates_outline() {
        let wf = workflow(happy_generator());
        let mut session = session_at(Stage::AwaitingDuration);
        let outcome = answer(&wf, &mut session, "4 weeks").await;

        assert_eq!(outcome.stage, Stage::AwaitingOutlineApproval);
        assert_eq!(session.outline.as_deref(), Some(OUTLINE));
        assert_eq!(session.context(ContextField::Duration), Some("4"));
        assert_eq!(session.context(ContextField::Platform), Some("LinkedIn"));
        let calls = wf.generator().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, AgentRole::Strategist);
        assert!(calls[0].2.contains("exactly 4 weeks"));
    }

    #[tokio::test]
    async fn test_outline_failure_retries_then_holds() {
        let generator = ScriptedGenerator::new()
            .fail(TaskKind::Outline)
            .fail(TaskKind::Outline)
            .fail(TaskKind::Outline)
            .respond(TaskKind::Outline, OUTLINE);
        let wf = workflow(generator);
        let mut session = session_at(Stage::AwaitingDuration);

        let err = wf.step(&mut session, Input::text("4")).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Invocation(_)));
        assert_eq!(session.stage(), Stage::GeneratingStrategy);
        assert_eq!(wf.generator().calls_of(TaskKind::Outline), 3);

        let outcome = wf.step(&mut session, Input::Retry).await.unwrap();
        assert_eq!(outcome.stage, Stage::AwaitingOutlineApproval);
    }

    #[tokio::test]
    async fn test_outline_feedback_regenerates() {
        let generator = happy_generator().respond(TaskKind::Outline, "Week 1: Leadership");
        let wf = workflow(generator);
        let mut session = session_at(Stage::AwaitingDuration);
        answer(&wf, &mut session, "4").await;

        let outcome = answer(&wf, &mut session, "more on leadership please").await;
        assert_eq!(outcome.stage, Stage::AwaitingOutlineApproval);
        assert_eq!(session.outline.as_deref(), Some("Week 1: Leadership"));
        let calls = wf.generator().calls();
        let last = &calls.last().unwrap().2;
        assert!(last.contains("more on leadership please"));
        assert!(last.contains(OUTLINE));
        assert!(session.strategy_history().is_empty());
    }

    #[tokio::test]
    async fn test_outline_approval_generates_strategy_and_title() {
        let wf = workflow(happy_generator());
        let mut session = session_at(Stage::AwaitingDuration);
        answer(&wf, &mut session, "4").await;

        let outcome = answer(&wf, &mut session, "looks good").await;
        assert_eq!(outcome.stage, Stage::AwaitingRefinement);
        assert_eq!(session.strategy_history().len(), 1);
        assert_eq!(session.current_strategy().unwrap().content, STRATEGY);
        assert_eq!(session.title, "Data To AI PM");
        assert!(outcome.notices.contains(&Notice::Info("Session renamed to: Data To AI PM".to_string())));
        assert!(session.messages().last().unwrap().content.contains(STRATEGY));
    }

    #[tokio::test]
    async fn test_title_failure_is_swallowed() {
        let generator = ScriptedGenerator::new()
            .respond(TaskKind::Outline, OUTLINE)
            .respond(TaskKind::Strategy, STRATEGY)
            .fail(TaskKind::Title);
        let wf = workflow(generator);
        let mut session = session_at(Stage::AwaitingDuration);
        answer(&wf, &mut session, "4").await;

        let outcome = answer(&wf, &mut session, "approve").await;
        assert_eq!(outcome.stage, Stage::AwaitingRefinement);
        assert_eq!(session.title, PLACEHOLDER_TITLE);
    }

    #[tokio::test]
    async fn test_feedback_refines_and_approval_ideates() {
        let generator = happy_generator()
            .respond(TaskKind::RefineStrategy, "v2 plan")
            .respond(TaskKind::RefineStrategy, "v3 plan");
        let wf = workflow(generator);
        let mut session = session_at(Stage::AwaitingDuration);
        answer(&wf, &mut session, "4").await;
        answer(&wf, &mut session, "perfect").await;

        let outcome = answer(&wf, &mut session, "please add more data").await;
        assert_eq!(outcome.stage, Stage::AwaitingRefinement);
        answer(&wf, &mut session, "shorter weeks").await;
        let versions: Vec<u32> = session.strategy_history().iter().map(|v| v.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
        assert_eq!(session.current_strategy().unwrap().content, "v3 plan");

        let outcome = answer(&wf, &mut session, "looks good").await;
        assert_eq!(outcome.stage, Stage::StrategyApproved);
        assert_eq!(session.post_ideas.len(), 3);
        assert_eq!(
            session.post_ideas.theme_names(),
            vec!["Career origin story".to_string(), "Data to AI lessons".to_string()]
        );
        let ideation = wf
            .generator()
            .calls()
            .into_iter()
            .find(|(kind, _, _)| *kind == TaskKind::Ideation)
            .unwrap();
        assert_eq!(ideation.1, AgentRole::Ideator);
        assert!(ideation.2.contains("v3 plan"));
    }

    #[tokio::test]
    async fn test_refine_failure_propagates_and_holds() {
        let wf = workflow(happy_generator());
        let mut session = session_at(Stage::AwaitingDuration);
        answer(&wf, &mut session, "4").await;
        answer(&wf, &mut session, "good").await;

        let err = wf.step(&mut session, Input::text("needs more data")).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Invocation(_)));
        assert_eq!(session.stage(), Stage::AwaitingRefinement);
        assert_eq!(session.strategy_history().len(), 1);
    }

    #[tokio::test]
    async fn test_same_inputs_reach_same_state() {
        async fn run() -> Session {
            let wf = workflow(happy_generator().respond(TaskKind::RefineStrategy, "v2 plan"));
            let mut session = Session::new();
            onboard(&wf, &mut session).await;
            answer(&wf, &mut session, "6 weeks").await;
            answer(&wf, &mut session, "looks good").await;
            answer(&wf, &mut session, "add data").await;
            answer(&wf, &mut session, "continue").await;
            session
        }
        let a = run().await;
        let b = run().await;
        assert_eq!(a.stage(), Stage::StrategyApproved);
        assert_eq!(a.stage(), b.stage());
        assert_eq!(a.post_ideas, b.post_ideas);
        assert_eq!(a.messages(), b.messages());
        assert_eq!(a.context_map(), b.context_map());
    }

    #[tokio::test]
    async fn test_transcript_is_append_only() {
        let wf = workflow(happy_generator());
        let mut session = Session::new();
        let mut seen = session.messages().to_vec();
        onboard(&wf, &mut session).await;
        assert!(session.messages().starts_with(&seen));
        seen = session.messages().to_vec();
        answer(&wf, &mut session, "4").await;
        assert!(session.messages().starts_with(&seen));
        assert!(session.messages().iter().any(|m| m.role == Role::User && m.content == "4"));
    }

    #[tokio::test]
    async fn test_unexpected_input() {
        let wf = workflow(ScriptedGenerator::new());
        let mut session = session_at(Stage::AwaitingTarget);
        let err = wf.step(&mut session, Input::SkipSamples).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::UnexpectedInput {
                stage: Stage::AwaitingTarget,
                ..
            }
        ));
    }

    #[test]
    fn test_strategy_version_lookup() {
        let wf = workflow(ScriptedGenerator::new());
        let mut session = session_at(Stage::AwaitingRefinement);
        session.push_strategy("one");
        session.push_strategy("two");
        assert_eq!(wf.strategy_version(&session, 1).unwrap().content, "one");
        assert!(matches!(
            wf.strategy_version(&session, 3),
            Err(WorkflowError::UnknownStrategyVersion(3))
        ));
    }

    #[test]
    fn test_set_platform() {
        let wf = workflow(ScriptedGenerator::new());
        let mut session = session_at(Stage::AwaitingDuration);
        wf.set_platform(&mut session, "Twitter");
        assert_eq!(wf.strategy_inputs(&session).platform, "Twitter");
        assert_eq!(wf.set_platform(&mut session, " ").warnings().count(), 1);
    }
}
