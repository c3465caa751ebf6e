//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

pub const SUMMARIZE_RESUME: &str = include_str!("../../prompts/summarize_resume.pmt");
pub const OUTLINE: &str = include_str!("../../prompts/outline.pmt");
pub const STRATEGY: &str = include_str!("../../prompts/strategy.pmt");
pub const REFINE_STRATEGY: &str = include_str!("../../prompts/refine_strategy.pmt");
pub const IDEATION: &str = include_str!("../../prompts/ideation.pmt");
pub const REFINE_IDEAS: &str = include_str!("../../prompts/refine_ideas.pmt");
pub const REGENERATE_IDEAS: &str = include_str!("../../prompts/regenerate_ideas.pmt");
pub const SIMILAR_IDEAS: &str = include_str!("../../prompts/similar_ideas.pmt");
pub const DRAFT_POST: &str = include_str!("../../prompts/draft_post.pmt");
pub const QA_REVIEW: &str = include_str!("../../prompts/qa_review.pmt");
pub const REFINE_POST: &str = include_str!("../../prompts/refine_post.pmt");
pub const TITLE: &str = include_str!("../../prompts/title.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    let prompt = match name {
        "summarize_resume" => SUMMARIZE_RESUME,
        "outline" => OUTLINE,
        "strategy" => STRATEGY,
        "refine_strategy" => REFINE_STRATEGY,
        "ideation" => IDEATION,
        "refine_ideas" => REFINE_IDEAS,
        "regenerate_ideas" => REGENERATE_IDEAS,
        "similar_ideas" => SIMILAR_IDEAS,
        "draft_post" => DRAFT_POST,
        "qa_review" => QA_REVIEW,
        "refine_post" => REFINE_POST,
        "title" => TITLE,
        _ => {
            debug!("get_embedded: no match found");
            return None;
        }
    };
    Some(prompt)
}
