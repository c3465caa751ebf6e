//! Task descriptors and the builder that produces them
//!
//! A [`TaskDescriptor`] is pure data: the instructions for one generation
//! step, the output contract the agent must honour, and any hard structural
//! constraints. Nothing here talks to a model.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::{PromptError, PromptLoader};
use crate::ideas::{Idea, render_bullets};

/// The kinds of generation task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    SummarizeResume,
    Outline,
    Strategy,
    RefineStrategy,
    Ideation,
    RefineIdeas,
    RegenerateIdeas,
    SimilarIdeas,
    DraftPost,
    QaReview,
    RefinePost,
    Title,
}

impl TaskKind {
    /// Template name used by the prompt loader
    pub fn template_name(&self) -> &'static str {
        match self {
            TaskKind::SummarizeResume => "summarize_resume",
            TaskKind::Outline => "outline",
            TaskKind::Strategy => "strategy",
            TaskKind::RefineStrategy => "refine_strategy",
            TaskKind::Ideation => "ideation",
            TaskKind::RefineIdeas => "refine_ideas",
            TaskKind::RegenerateIdeas => "regenerate_ideas",
            TaskKind::SimilarIdeas => "similar_ideas",
            TaskKind::DraftPost => "draft_post",
            TaskKind::QaReview => "qa_review",
            TaskKind::RefinePost => "refine_post",
            TaskKind::Title => "title",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.template_name())
    }
}

/// A fully specified generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub kind: TaskKind,
    pub instructions: String,
    pub expected_output: String,
    pub constraints: Vec<String>,
}

impl TaskDescriptor {
    /// The user message sent to the agent
    pub fn render(&self) -> String {
        let mut out = self.instructions.trim_end().to_string();
        if !self.constraints.is_empty() {
            out.push_str("\n\nHARD CONSTRAINTS:\n");
            for constraint in &self.constraints {
                out.push_str("- ");
                out.push_str(constraint);
                out.push('\n');
            }
        }
        out.push_str("\n\nEXPECTED OUTPUT:\n");
        out.push_str(&self.expected_output);
        out
    }
}

/// The onboarding answers a strategy task needs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StrategyInputs {
    pub user_context: String,
    pub target_role: String,
    pub target_audience: String,
    pub positioning: String,
    pub platform: String,
    pub duration: u32,
    pub writing_samples: String,
}

/// A weekday-labelled theme pulled from a strategy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTheme {
    pub day: String,
    pub theme: String,
}

static DAY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t>*#\-]*(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\**[ \t]*[:\-–][ \t]*\**[ \t]*(.+?)[ \t]*$",
    )
    .expect("valid weekday regex")
});

/// Extract `Monday: <theme>` style lines from a strategy document
pub fn extract_day_themes(strategy: &str) -> Vec<DayTheme> {
    DAY_LINE
        .captures_iter(strategy)
        .filter_map(|caps| {
            let day = caps.get(1)?.as_str();
            let theme = caps.get(2)?.as_str().trim_matches(|c: char| c == '*' || c.is_whitespace());
            if theme.is_empty() {
                return None;
            }
            let mut label = day.to_lowercase();
            if let Some(first) = label.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            Some(DayTheme {
                day: label,
                theme: theme.to_string(),
            })
        })
        .collect()
}

const IDEA_FORMAT: &str = "Use ONLY the line prefix `THEME: ` for theme headers and `- ` for idea bullets. \
                           One idea per bullet. No numbering, no other text before the first `THEME: `.";

/// Builds task descriptors from stage inputs
pub struct TaskBuilder {
    loader: PromptLoader,
}

impl TaskBuilder {
    pub fn new(loader: PromptLoader) -> Self {
        Self { loader }
    }

    fn task<T: Serialize>(
        &self,
        kind: TaskKind,
        context: &T,
        expected_output: impl Into<String>,
        constraints: Vec<String>,
    ) -> Result<TaskDescriptor, PromptError> {
        debug!(%kind, "TaskBuilder::task: called");
        Ok(TaskDescriptor {
            kind,
            instructions: self.loader.render(kind.template_name(), context)?,
            expected_output: expected_output.into(),
            constraints,
        })
    }

    pub fn summarize_resume(&self, resume: &str) -> Result<TaskDescriptor, PromptError> {
        self.task(
            TaskKind::SummarizeResume,
            &serde_json::json!({ "resume": resume }),
            "A short summary paragraph (under 150 words) ending with a confirmation question.",
            vec![],
        )
    }

    /// Condensed pre-approval plan; `feedback` regenerates a rejected outline
    pub fn outline(
        &self,
        inputs: &StrategyInputs,
        previous: Option<&str>,
        feedback: Option<&str>,
    ) -> Result<TaskDescriptor, PromptError> {
        let mut context = serde_json::to_value(inputs).unwrap_or_default();
        context["previous_outline"] = serde_json::json!(previous.unwrap_or_default());
        context["feedback"] = serde_json::json!(feedback.unwrap_or_default());
        self.task(
            TaskKind::Outline,
            &context,
            format!(
                "A markdown outline with exactly {} week entries, each a one-line theme plus one line of rationale.",
                inputs.duration
            ),
            vec![weeks_constraint(inputs.duration)],
        )
    }

    pub fn strategy(&self, inputs: &StrategyInputs, outline: &str) -> Result<TaskDescriptor, PromptError> {
        let mut context = serde_json::to_value(inputs).unwrap_or_default();
        context["outline"] = serde_json::json!(outline);
        self.task(
            TaskKind::Strategy,
            &context,
            format!(
                "A markdown document outlining a {}-week content plan. Each week has a clear theme and actionable \
                 content ideas tailored for {}.",
                inputs.duration, inputs.platform
            ),
            vec![
                weeks_constraint(inputs.duration),
                "Label every posting day on its own line as `<Weekday>: <theme of the day>`.".to_string(),
            ],
        )
    }

    pub fn refine_strategy(
        &self,
        inputs: &StrategyInputs,
        previous: &str,
        critique: &str,
    ) -> Result<TaskDescriptor, PromptError> {
        let mut context = serde_json::to_value(inputs).unwrap_or_default();
        context["previous"] = serde_json::json!(previous);
        context["critique"] = serde_json::json!(critique);
        self.task(
            TaskKind::RefineStrategy,
            &context,
            "A new, improved content plan that directly addresses the user's critique and is substantially \
             different from the previous version.",
            vec![
                weeks_constraint(inputs.duration),
                "Label every posting day on its own line as `<Weekday>: <theme of the day>`.".to_string(),
            ],
        )
    }

    /// Ideas for every weekday theme found in the strategy
    pub fn ideation(&self, strategy: &str, ideas_per_theme: usize) -> Result<TaskDescriptor, PromptError> {
        let day_themes = extract_day_themes(strategy);
        debug!(themes = day_themes.len(), "TaskBuilder::ideation: extracted day themes");
        self.task(
            TaskKind::Ideation,
            &serde_json::json!({
                "strategy": strategy,
                "day_themes": day_themes,
                "ideas_per_theme": ideas_per_theme,
            }),
            format!("For each theme, a `THEME: <name>` line followed by {} `- ` idea bullets.", ideas_per_theme),
            vec![IDEA_FORMAT.to_string()],
        )
    }

    /// Rewrite the selected ideas; `selected` pairs each idea with its theme
    pub fn refine_ideas(&self, selected: &[(String, Idea)], critique: &str) -> Result<TaskDescriptor, PromptError> {
        let selected: Vec<_> = selected
            .iter()
            .map(|(theme, idea)| serde_json::json!({ "theme": theme, "text": idea.text }))
            .collect();
        self.task(
            TaskKind::RefineIdeas,
            &serde_json::json!({ "selected": selected, "critique": critique }),
            format!("The {} rewritten ideas, grouped under their original themes.", selected.len()),
            vec![IDEA_FORMAT.to_string()],
        )
    }

    /// Replace ideas within one theme, aiming for `count` new ones
    pub fn regenerate_ideas(
        &self,
        theme: &str,
        count: usize,
        strategy: &str,
        keep: &[Idea],
        replaced: &[Idea],
    ) -> Result<TaskDescriptor, PromptError> {
        self.task(
            TaskKind::RegenerateIdeas,
            &serde_json::json!({
                "theme": theme,
                "count": count,
                "strategy": strategy,
                "keep": render_bullets(keep),
                "replaced": render_bullets(replaced),
            }),
            format!("A single `THEME: {}` line followed by exactly {} `- ` idea bullets.", theme, count),
            vec![IDEA_FORMAT.to_string()],
        )
    }

    pub fn similar_ideas(&self, theme: &str, exemplar: &str, count: usize) -> Result<TaskDescriptor, PromptError> {
        self.task(
            TaskKind::SimilarIdeas,
            &serde_json::json!({ "theme": theme, "exemplar": exemplar, "count": count }),
            format!("A single `THEME: {}` line followed by exactly {} `- ` idea bullets.", theme, count),
            vec![IDEA_FORMAT.to_string()],
        )
    }

    pub fn draft_post(&self, idea: &str, inputs: &StrategyInputs) -> Result<TaskDescriptor, PromptError> {
        let mut context = serde_json::to_value(inputs).unwrap_or_default();
        context["idea"] = serde_json::json!(idea);
        self.task(
            TaskKind::DraftPost,
            &context,
            format!("The complete text for a single, polished {} post, formatted with markdown.", inputs.platform),
            vec![],
        )
    }

    pub fn qa_review(&self, idea: &str, draft: &str) -> Result<TaskDescriptor, PromptError> {
        self.task(
            TaskKind::QaReview,
            &serde_json::json!({ "idea": idea, "draft": draft }),
            "A bulleted list of constructive feedback OR a simple 'This post is approved and ready to publish.' \
             statement.",
            vec![],
        )
    }

    pub fn refine_post(&self, draft: &str, critique: &str) -> Result<TaskDescriptor, PromptError> {
        self.task(
            TaskKind::RefinePost,
            &serde_json::json!({ "draft": draft, "critique": critique }),
            "The complete revised post, formatted with markdown.",
            vec![],
        )
    }

    pub fn title(&self, text: &str) -> Result<TaskDescriptor, PromptError> {
        self.task(
            TaskKind::Title,
            &serde_json::json!({ "text": text }),
            "A single line of text containing only the 3-5 word title.",
            vec!["Between 3 and 5 words. No quotes, no trailing punctuation.".to_string()],
        )
    }
}

fn weeks_constraint(duration: u32) -> String {
    format!("The plan must be exactly {} weeks long.", duration)
}
