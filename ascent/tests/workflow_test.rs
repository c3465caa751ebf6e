//! Integration tests for the Ascent workflow
//!
//! Drives whole sessions through the public API with a canned generator.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use ascent::agents::{AgentRole, Generator, InvocationError, RetryPolicy};
use ascent::config::WorkflowConfig;
use ascent::export::{export_draft, export_strategy};
use ascent::extract::UploadedDocument;
use ascent::ideas::{Idea, parse_ideas, render_ideas};
use ascent::prompts::{PromptLoader, TaskBuilder, TaskDescriptor, TaskKind};
use ascent::session::{ContextField, SessionStore};
use ascent::workflow::{Input, RegenScope, ResumeChoice, Stage, Workflow};

const STRATEGY: &str = "## Week 1\nMonday: Career origin story\nThursday: Data to AI lessons\n";
const IDEAS: &str = "Here are your ideas.\nTHEME: Career origin story\n- Why I left pipelines for products\n\
                     - My first model in production\nTHEME: Data to AI lessons\n- Three habits that transfer\n";

/// Answers every task kind with fixed text; drafting can be made to fail
#[derive(Default)]
struct CannedGenerator {
    fail_drafting: bool,
    refinements: AtomicUsize,
    calls: Mutex<Vec<(TaskKind, AgentRole)>>,
}

impl CannedGenerator {
    fn failing_drafts() -> Self {
        Self {
            fail_drafting: true,
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<(TaskKind, AgentRole)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate(&self, task: &TaskDescriptor, role: AgentRole) -> Result<String, InvocationError> {
        self.calls.lock().unwrap().push((task.kind, role));
        let text = match task.kind {
            TaskKind::SummarizeResume => "You lead data platforms at scale. Did I get that right?".to_string(),
            TaskKind::Outline => "Week 1: Origins\nWeek 2: Lessons".to_string(),
            TaskKind::Strategy => STRATEGY.to_string(),
            TaskKind::RefineStrategy => {
                let n = self.refinements.fetch_add(1, Ordering::SeqCst) + 2;
                format!("Refined strategy v{}", n)
            }
            TaskKind::Title => "\"Data To AI PM\"".to_string(),
            TaskKind::Ideation => IDEAS.to_string(),
            TaskKind::RefineIdeas => "THEME: Career origin story\n- Sharper origin hook\n".to_string(),
            TaskKind::RegenerateIdeas => "THEME: ignored\n- Fresh idea\n".to_string(),
            TaskKind::SimilarIdeas => "THEME: ignored\n- Similar one\n- Similar two\n".to_string(),
            TaskKind::DraftPost if self.fail_drafting => return Err(InvocationError::EmptyOutput(role)),
            TaskKind::DraftPost => "I spent six years building pipelines...".to_string(),
            TaskKind::QaReview => "- Open with the result".to_string(),
            TaskKind::RefinePost => "Six years of pipelines taught me one thing.".to_string(),
        };
        Ok(text)
    }
}

fn workflow(generator: CannedGenerator) -> Workflow<CannedGenerator> {
    Workflow::new(
        generator,
        TaskBuilder::new(PromptLoader::embedded_only()),
        WorkflowConfig::default(),
    )
    .with_retry(RetryPolicy::once())
}

async fn say(wf: &Workflow<CannedGenerator>, store: &mut SessionStore, text: &str) -> Stage {
    let session = store.active_mut().unwrap();
    wf.step(session, Input::text(text)).await.unwrap().stage
}

/// Onboard via resume upload and approve the strategy
async fn approved_session(wf: &Workflow<CannedGenerator>, store: &mut SessionStore) {
    let id = store.create();
    store.set_active(&id).unwrap();
    let session = store.active_mut().unwrap();
    wf.begin(session).unwrap();
    wf.step(session, Input::ResumeChoice(ResumeChoice::Upload)).await.unwrap();
    let docs = vec![UploadedDocument::new("resume.txt", "Staff data engineer, 10 years")];
    assert_eq!(
        wf.step(session, Input::Documents(docs)).await.unwrap().stage,
        Stage::AwaitingConfirmation
    );

    assert_eq!(say(wf, store, "Yes, and I mentor juniors").await, Stage::AwaitingTarget);
    assert_eq!(say(wf, store, "AI Product Manager").await, Stage::AwaitingAudience);
    assert_eq!(say(wf, store, "Hiring managers").await, Stage::AwaitingPositioning);
    assert_eq!(say(wf, store, "pragmatic builder").await, Stage::AwaitingSamples);
    assert_eq!(say(wf, store, "Shipping beats perfect plans.").await, Stage::AwaitingDuration);
    assert_eq!(say(wf, store, "8 weeks").await, Stage::AwaitingOutlineApproval);
    assert_eq!(say(wf, store, "looks good").await, Stage::AwaitingRefinement);
    assert_eq!(say(wf, store, "please add more data").await, Stage::AwaitingRefinement);
    assert_eq!(say(wf, store, "approve").await, Stage::StrategyApproved);
}

#[tokio::test]
async fn test_full_flow_to_post_drafted() {
    let wf = workflow(CannedGenerator::default());
    let mut store = SessionStore::new();
    approved_session(&wf, &mut store).await;

    let session = store.active_mut().unwrap();
    assert_eq!(session.title, "Data To AI PM");
    assert_eq!(session.context(ContextField::Duration), Some("8"));
    assert_eq!(session.context(ContextField::Platform), Some("LinkedIn"));
    assert_eq!(session.context(ContextField::WritingSamples), Some("Shipping beats perfect plans."));
    assert!(
        session
            .context(ContextField::UserContext)
            .unwrap()
            .ends_with("Additional User Notes:\nYes, and I mentor juniors")
    );

    let versions: Vec<u32> = session.strategy_history().iter().map(|v| v.version).collect();
    assert_eq!(versions, vec![1, 2]);
    assert_eq!(session.current_strategy().unwrap().content, "Refined strategy v2");
    assert_eq!(session.post_ideas.len(), 3);

    let outcome = wf.select_idea(session, "Career origin story", 1).await.unwrap();
    assert_eq!(outcome.stage, Stage::PostDrafted);
    assert_eq!(session.selected_idea.as_deref(), Some("My first model in production"));
    assert_eq!(session.critique.as_deref(), Some("- Open with the result"));

    // Free text in post_drafted refines the draft
    let outcome = wf.step(session, Input::text("shorter opening")).await.unwrap();
    assert_eq!(outcome.stage, Stage::PostDrafted);
    assert_eq!(session.draft.as_deref(), Some("Six years of pipelines taught me one thing."));
    assert!(session.critique.is_none());
    assert_eq!(session.draft_history().len(), 2);

    let roles: Vec<AgentRole> = wf.generator().calls().into_iter().map(|(_, role)| role).collect();
    assert_eq!(roles[0], AgentRole::Summarizer);
    assert!(roles.contains(&AgentRole::Titler));
    assert!(roles.contains(&AgentRole::Reviewer));
}

#[tokio::test]
async fn test_drafting_failure_rolls_back() {
    let wf = workflow(CannedGenerator::failing_drafts());
    let mut store = SessionStore::new();
    approved_session(&wf, &mut store).await;

    let session = store.active_mut().unwrap();
    let outcome = wf.select_idea(session, "Data to AI lessons", 0).await.unwrap();
    assert_eq!(outcome.stage, Stage::StrategyApproved);
    assert_eq!(session.stage(), Stage::StrategyApproved);
    assert!(session.selected_idea.is_none());
    assert_eq!(outcome.errors().count(), 1);
}

#[tokio::test]
async fn test_idea_operations_between_drafts() {
    let wf = workflow(CannedGenerator::default());
    let mut store = SessionStore::new();
    approved_session(&wf, &mut store).await;
    let session = store.active_mut().unwrap();

    wf.toggle_idea(session, "Career origin story", 0).unwrap();
    wf.refine_ideas(session, "sharper").await.unwrap();
    assert_eq!(
        session.post_ideas.ideas("Career origin story").unwrap(),
        &[
            Idea::new("My first model in production", false),
            Idea::new("Sharper origin hook", false)
        ]
    );

    wf.toggle_idea(session, "Career origin story", 0).unwrap();
    wf.regenerate_ideas(session, RegenScope::Theme("Career origin story".to_string()))
        .await
        .unwrap();
    assert_eq!(
        session.post_ideas.ideas("Career origin story").unwrap(),
        &[Idea::new("My first model in production", true), Idea::new("Fresh idea", false)]
    );

    wf.similar_ideas(session, "Data to AI lessons", 0).await.unwrap();
    assert_eq!(session.post_ideas.ideas("Data to AI lessons").unwrap().len(), 3);

    wf.move_idea(session, "Data to AI lessons", 2, "Tools").unwrap();
    wf.add_idea(session, "Tools", "My editor setup").unwrap();
    assert_eq!(
        session.post_ideas.ideas("Tools").unwrap(),
        &[Idea::new("Similar two", false), Idea::new("My editor setup", false)]
    );
}

#[tokio::test]
async fn test_exports_use_title() {
    let wf = workflow(CannedGenerator::default());
    let mut store = SessionStore::new();
    approved_session(&wf, &mut store).await;
    let session = store.active_mut().unwrap();
    wf.select_idea(session, "Career origin story", 0).await.unwrap();

    let dir = TempDir::new().unwrap();
    let strategy = export_strategy(session, dir.path()).unwrap();
    assert_eq!(strategy.file_name().unwrap(), "Data_To_AI_PM_strategy.md");
    assert_eq!(std::fs::read_to_string(&strategy).unwrap(), "Refined strategy v2");

    let draft = export_draft(session, dir.path(), chrono::Local::now()).unwrap();
    let name = draft.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("Data_To_AI_PM_post_"));
    assert!(name.ends_with(".md"));
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let wf = workflow(CannedGenerator::default());
    let mut store = SessionStore::new();
    approved_session(&wf, &mut store).await;
    let first = store.active_id().unwrap().clone();

    let second = store.create();
    store.set_active(&second).unwrap();
    wf.begin(store.active_mut().unwrap()).unwrap();

    assert_eq!(store.get(&first).unwrap().stage(), Stage::StrategyApproved);
    assert_eq!(store.get(&second).unwrap().stage(), Stage::AwaitingResumeChoice);
    let recent: Vec<_> = store.list_recent().into_iter().map(|s| s.id().clone()).collect();
    assert_eq!(recent, vec![second.clone(), first.clone()]);

    store.delete(&first).unwrap();
    assert_eq!(store.active_id(), Some(&second));
    store.delete(&second).unwrap();
    assert!(store.active_id().is_none());
}

#[test]
fn test_parser_scenario_and_round_trip() {
    let text = "THEME: Leadership\n- Share a lesson from a failed project\n- Discuss mentoring junior engineers\n\
                THEME: AI Trends\n- React to a recent industry report\n";
    let board = parse_ideas(text, false);
    assert_eq!(
        board.ideas("Leadership").unwrap(),
        &[
            Idea::new("Share a lesson from a failed project", false),
            Idea::new("Discuss mentoring junior engineers", false)
        ]
    );
    assert_eq!(
        board.ideas("AI Trends").unwrap(),
        &[Idea::new("React to a recent industry report", false)]
    );
    assert_eq!(parse_ideas(&render_ideas(&board), false), board);
}
