//! Session aggregate
//!
//! A [`Session`] is one branding workflow. The transcript and the strategy
//! history are append-only; the workflow is the only writer of `stage`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ideas::IdeaBoard;
use crate::llm::Role;
use crate::workflow::Stage;

/// Title every session starts with
pub const PLACEHOLDER_TITLE: &str = "New Session";

/// First assistant message of every session
pub const SEED_MESSAGE: &str = "Hi, I'm Ascent AI, your personal branding co-pilot. Let's build a content strategy \
                                that gets you noticed. Would you like to upload your resume, or skip and describe \
                                yourself?";

/// Opaque session identifier (UUIDv7)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing 8 characters, the random part of a v7 id
    pub fn short(&self) -> &str {
        let start = self.0.len().saturating_sub(8);
        self.0.get(start..).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Onboarding answers collected into the session context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextField {
    UserContext,
    TargetRole,
    TargetAudience,
    Positioning,
    Platform,
    Duration,
    WritingSamples,
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyVersion {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftVersion {
    pub timestamp: DateTime<Utc>,
    pub content: String,
}

/// One branding workflow instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    pub title: String,
    stage: Stage,
    messages: Vec<ChatMessage>,
    context: BTreeMap<ContextField, String>,
    strategy_history: Vec<StrategyVersion>,
    /// Last outline shown for approval
    pub outline: Option<String>,
    pub post_ideas: IdeaBoard,
    draft_history: Vec<DraftVersion>,
    /// Current working draft, edited in place
    pub draft: Option<String>,
    /// Reviewer feedback on the current draft
    pub critique: Option<String>,
    pub selected_idea: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// A fresh session in [`Stage::Start`] with the seed message
    pub fn new() -> Self {
        Self {
            id: SessionId::generate(),
            title: PLACEHOLDER_TITLE.to_string(),
            stage: Stage::Start,
            messages: vec![ChatMessage {
                role: Role::Assistant,
                content: SEED_MESSAGE.to_string(),
            }],
            context: BTreeMap::new(),
            strategy_history: Vec::new(),
            outline: None,
            post_ideas: IdeaBoard::new(),
            draft_history: Vec::new(),
            draft: None,
            critique: None,
            selected_idea: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            role: Role::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    pub fn context(&self, field: ContextField) -> Option<&str> {
        self.context.get(&field).map(String::as_str)
    }

    pub fn set_context(&mut self, field: ContextField, value: impl Into<String>) {
        self.context.insert(field, value.into());
    }

    /// Append to a context field, separated by a blank line
    pub fn append_context(&mut self, field: ContextField, value: &str) {
        let entry = self.context.entry(field).or_default();
        if !entry.is_empty() {
            entry.push_str("\n\n");
        }
        entry.push_str(value);
    }

    pub fn context_map(&self) -> &BTreeMap<ContextField, String> {
        &self.context
    }

    pub fn strategy_history(&self) -> &[StrategyVersion] {
        &self.strategy_history
    }

    /// Record a new strategy version; returns its number
    pub fn push_strategy(&mut self, content: impl Into<String>) -> u32 {
        let version = self.strategy_history.last().map_or(1, |v| v.version + 1);
        self.strategy_history.push(StrategyVersion {
            version,
            timestamp: Utc::now(),
            content: content.into(),
        });
        version
    }

    pub fn current_strategy(&self) -> Option<&StrategyVersion> {
        self.strategy_history.last()
    }

    pub fn strategy_version(&self, version: u32) -> Option<&StrategyVersion> {
        self.strategy_history.iter().find(|v| v.version == version)
    }

    pub fn draft_history(&self) -> &[DraftVersion] {
        &self.draft_history
    }

    /// Set the current draft and record it in history
    pub fn push_draft(&mut self, content: impl Into<String>) {
        let content = content.into();
        self.draft_history.push(DraftVersion {
            timestamp: Utc::now(),
            content: content.clone(),
        });
        self.draft = Some(content);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
