//! User inputs and the small predicates used to interpret them

use std::sync::LazyLock;

use regex::Regex;

use crate::extract::UploadedDocument;

/// Tokens whose presence marks a reply as approval
pub const APPROVAL_TOKENS: [&str; 4] = ["good", "approve", "perfect", "continue"];

/// True iff `text` contains any approval token, case-insensitively
///
/// This is a substring test: "not good" approves, "ok" does not.
pub fn is_approval(text: &str) -> bool {
    let lower = text.to_lowercase();
    APPROVAL_TOKENS.iter().any(|token| lower.contains(token))
}

static WEEKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid weeks regex"));

/// First integer in a duration answer such as "4 weeks"
pub fn parse_weeks(text: &str) -> Option<u32> {
    WEEKS.find(text).and_then(|m| m.as_str().parse().ok())
}

const SKIP_WORDS: [&str; 6] = ["skip", "describe", "no resume", "don't have", "do not have", "without"];

/// Answer to "upload a resume or describe yourself?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeChoice {
    Upload,
    Skip,
}

impl ResumeChoice {
    /// Interpret a free-text answer
    ///
    /// Skip words win over a mention of "resume", so "skip, no resume" skips.
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.trim().to_lowercase();
        if SKIP_WORDS.iter().any(|word| lower.contains(word)) {
            Some(ResumeChoice::Skip)
        } else if lower.contains("upload") || lower.contains("resume") {
            Some(ResumeChoice::Upload)
        } else {
            None
        }
    }
}

/// One conversational input
#[derive(Debug, Clone)]
pub enum Input {
    ResumeChoice(ResumeChoice),
    Text(String),
    Documents(Vec<UploadedDocument>),
    SkipSamples,
    /// Re-run a generation that failed in `generating_strategy`
    Retry,
}

impl Input {
    pub fn text(text: impl Into<String>) -> Self {
        Input::Text(text.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Input::ResumeChoice(_) => "resume choice",
            Input::Text(_) => "text",
            Input::Documents(_) => "documents",
            Input::SkipSamples => "skip samples",
            Input::Retry => "retry",
        }
    }
}
