//! Generator trait and the LLM-backed invoker

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use eyre::{Context, Result};
use tracing::{debug, warn};

use super::AgentRole;
use crate::config::LlmConfig;
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message, create_client};
use crate::prompts::TaskDescriptor;

/// Errors from executing a task against an agent
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("{role} call failed: {source}")]
    Llm {
        role: AgentRole,
        #[source]
        source: LlmError,
    },

    #[error("{0} returned no output")]
    EmptyOutput(AgentRole),

    #[error("No model bound to role {0}")]
    Unbound(AgentRole),
}

impl InvocationError {
    pub fn role(&self) -> AgentRole {
        match self {
            InvocationError::Llm { role, .. } => *role,
            InvocationError::EmptyOutput(role) | InvocationError::Unbound(role) => *role,
        }
    }

    /// Whether a later attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            InvocationError::Llm { source, .. } => source.is_transient(),
            InvocationError::EmptyOutput(_) => true,
            InvocationError::Unbound(_) => false,
        }
    }
}

/// Capability to run one generation task as a given role
///
/// Each call is attempt-once; callers that want retries wrap it with
/// [`generate_with_retry`](super::generate_with_retry).
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, task: &TaskDescriptor, role: AgentRole) -> Result<String, InvocationError>;
}

struct Binding {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
}

/// Invokes tasks against the LLM client bound to each role
pub struct AgentInvoker {
    bindings: HashMap<AgentRole, Binding>,
}

impl AgentInvoker {
    /// Create an invoker with no roles bound
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Bind every role to the client for its configured profile
    ///
    /// Roles sharing a profile share one client.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        debug!("AgentInvoker::from_config: called");
        let mut clients: HashMap<String, Arc<dyn LlmClient>> = HashMap::new();
        let mut invoker = Self::empty();
        for role in AgentRole::ALL {
            let name = config.roles.profile_name(role).to_string();
            let profile = config.profile_for(role)?;
            let client = match clients.get(&name) {
                Some(client) => client.clone(),
                None => {
                    let client = create_client(profile)
                        .with_context(|| format!("Failed to create LLM client for profile '{}'", name))?;
                    clients.insert(name.clone(), client.clone());
                    client
                }
            };
            debug!(%role, profile = %name, model = %client.model(), "AgentInvoker::from_config: bound role");
            invoker = invoker.with_client(role, client, profile.max_tokens);
        }
        Ok(invoker)
    }

    /// Bind a single role to a client
    pub fn with_client(mut self, role: AgentRole, client: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        self.bindings.insert(role, Binding { client, max_tokens });
        self
    }

    /// Model serving a role, if bound
    pub fn model_for(&self, role: AgentRole) -> Option<&str> {
        self.bindings.get(&role).map(|b| b.client.model())
    }
}

#[async_trait]
impl Generator for AgentInvoker {
    async fn generate(&self, task: &TaskDescriptor, role: AgentRole) -> Result<String, InvocationError> {
        debug!(%role, kind = %task.kind, "AgentInvoker::generate: called");
        let binding = self.bindings.get(&role).ok_or(InvocationError::Unbound(role))?;

        let request = CompletionRequest {
            system_prompt: role.persona().system_prompt(),
            messages: vec![Message::user(task.render())],
            max_tokens: binding.max_tokens,
        };

        let response = binding.client.complete(request).await.map_err(|source| {
            warn!(%role, error = %source, "AgentInvoker::generate: completion failed");
            InvocationError::Llm { role, source }
        })?;
        debug!(
            %role,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "AgentInvoker::generate: completion returned"
        );

        match response.content.map(|c| c.trim().to_string()) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => {
                debug!(%role, "AgentInvoker::generate: empty output");
                Err(InvocationError::EmptyOutput(role))
            }
        }
    }
}
