//! Conversation stages and the transition table

use serde::{Deserialize, Serialize};

/// Where a session is in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Start,
    AwaitingResumeChoice,
    AwaitingResumeUpload,
    AwaitingIntro,
    AwaitingConfirmation,
    AwaitingTarget,
    AwaitingAudience,
    AwaitingPositioning,
    AwaitingSamples,
    AwaitingDuration,
    GeneratingStrategy,
    AwaitingOutlineApproval,
    AwaitingRefinement,
    StrategyApproved,
    DraftingPost,
    PostDrafted,
}

/// Every allowed `(from, to)` edge; anything else is rejected
const TRANSITIONS: &[(Stage, Stage)] = &[
    (Stage::Start, Stage::AwaitingResumeChoice),
    (Stage::AwaitingResumeChoice, Stage::AwaitingResumeUpload),
    (Stage::AwaitingResumeChoice, Stage::AwaitingIntro),
    (Stage::AwaitingResumeUpload, Stage::AwaitingConfirmation),
    (Stage::AwaitingIntro, Stage::AwaitingTarget),
    (Stage::AwaitingConfirmation, Stage::AwaitingTarget),
    (Stage::AwaitingTarget, Stage::AwaitingAudience),
    (Stage::AwaitingAudience, Stage::AwaitingPositioning),
    (Stage::AwaitingPositioning, Stage::AwaitingSamples),
    (Stage::AwaitingSamples, Stage::AwaitingDuration),
    (Stage::AwaitingDuration, Stage::GeneratingStrategy),
    (Stage::GeneratingStrategy, Stage::AwaitingOutlineApproval),
    (Stage::AwaitingOutlineApproval, Stage::AwaitingOutlineApproval),
    (Stage::AwaitingOutlineApproval, Stage::AwaitingRefinement),
    (Stage::AwaitingRefinement, Stage::AwaitingRefinement),
    (Stage::AwaitingRefinement, Stage::StrategyApproved),
    (Stage::StrategyApproved, Stage::DraftingPost),
    (Stage::DraftingPost, Stage::PostDrafted),
    (Stage::DraftingPost, Stage::StrategyApproved),
    (Stage::PostDrafted, Stage::PostDrafted),
    (Stage::PostDrafted, Stage::DraftingPost),
];

impl Stage {
    pub const ALL: [Stage; 16] = [
        Stage::Start,
        Stage::AwaitingResumeChoice,
        Stage::AwaitingResumeUpload,
        Stage::AwaitingIntro,
        Stage::AwaitingConfirmation,
        Stage::AwaitingTarget,
        Stage::AwaitingAudience,
        Stage::AwaitingPositioning,
        Stage::AwaitingSamples,
        Stage::AwaitingDuration,
        Stage::GeneratingStrategy,
        Stage::AwaitingOutlineApproval,
        Stage::AwaitingRefinement,
        Stage::StrategyApproved,
        Stage::DraftingPost,
        Stage::PostDrafted,
    ];

    pub fn can_transition(self, to: Stage) -> bool {
        TRANSITIONS.iter().any(|&(f, t)| f == self && t == to)
    }

    /// Stages reachable in one step
    pub fn successors(self) -> impl Iterator<Item = Stage> {
        TRANSITIONS.iter().filter(move |(f, _)| *f == self).map(|&(_, t)| t)
    }

    /// Idea board operations are open once the strategy is approved
    pub fn allows_idea_ops(self) -> bool {
        matches!(self, Stage::StrategyApproved | Stage::PostDrafted)
    }

    /// What the assistant asks for in this stage, if it waits on free text
    pub fn prompt(self) -> Option<&'static str> {
        match self {
            Stage::AwaitingResumeChoice => Some("Would you like to upload your resume, or skip and describe yourself?"),
            Stage::AwaitingResumeUpload => Some("Please upload your resume (PDF, TXT or MD)."),
            Stage::AwaitingIntro => Some("Please give me a brief summary of your professional background and goals."),
            Stage::AwaitingConfirmation => Some("Did I get that right? Is there anything else to add?"),
            Stage::AwaitingTarget => Some("What is your target role? (e.g., AI Product Manager)"),
            Stage::AwaitingAudience => Some("Who is your target audience? (e.g., Recruiters, industry peers)"),
            Stage::AwaitingPositioning => Some("How do you want to come across? (e.g., authoritative, approachable)"),
            Stage::AwaitingSamples => Some(
                "Paste a few of your past posts or writing samples so I can match your voice, upload files, or skip.",
            ),
            Stage::AwaitingDuration => Some("How many weeks should the content plan cover? (e.g., '4 weeks')"),
            Stage::AwaitingOutlineApproval => {
                Some("Approve the outline (e.g. 'looks good') or tell me what to change.")
            }
            Stage::AwaitingRefinement => Some("Provide feedback to refine the strategy, or type 'looks good' to approve."),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::AwaitingResumeChoice => "awaiting_resume_choice",
            Stage::AwaitingResumeUpload => "awaiting_resume_upload",
            Stage::AwaitingIntro => "awaiting_intro",
            Stage::AwaitingConfirmation => "awaiting_confirmation",
            Stage::AwaitingTarget => "awaiting_target",
            Stage::AwaitingAudience => "awaiting_audience",
            Stage::AwaitingPositioning => "awaiting_positioning",
            Stage::AwaitingSamples => "awaiting_samples",
            Stage::AwaitingDuration => "awaiting_duration",
            Stage::GeneratingStrategy => "generating_strategy",
            Stage::AwaitingOutlineApproval => "awaiting_outline_approval",
            Stage::AwaitingRefinement => "awaiting_refinement",
            Stage::StrategyApproved => "strategy_approved",
            Stage::DraftingPost => "drafting_post",
            Stage::PostDrafted => "post_drafted",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
