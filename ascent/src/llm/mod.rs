//! LLM client module
//!
//! Provides the completion client abstraction and the provider factory.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use crate::config::LlmProfile;

/// Create an LLM client for a provider profile
///
/// Supports the "openai" provider (any OpenAI-compatible endpoint, which
/// includes Gemini and Groq).
pub fn create_client(profile: &LlmProfile) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %profile.provider, model = %profile.model, "create_client: called");
    match profile.provider.as_str() {
        "openai" | "gemini" | "groq" => Ok(Arc::new(OpenAIClient::from_profile(profile)?)),
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::InvalidResponse(format!(
                "Unknown LLM provider: '{}'. Supported: openai, gemini, groq",
                other
            )))
        }
    }
}
