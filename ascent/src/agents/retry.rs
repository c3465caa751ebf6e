//! Bounded retry around a generator call

use std::time::Duration;

use tracing::{debug, warn};

use super::{AgentRole, Generator, InvocationError};
use crate::config::RetryConfig;
use crate::prompts::TaskDescriptor;

/// Fixed attempt count with a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// A single attempt, no retry
    pub fn once() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            attempts: config.attempts.max(1),
            delay: config.delay(),
        }
    }
}

/// Run a task, retrying failures up to the policy's attempt count
///
/// Returns the last error once every attempt has failed.
pub async fn generate_with_retry<G: Generator + ?Sized>(
    generator: &G,
    task: &TaskDescriptor,
    role: AgentRole,
    policy: RetryPolicy,
) -> Result<String, InvocationError> {
    debug!(%role, kind = %task.kind, attempts = policy.attempts, "generate_with_retry: called");
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match generator.generate(task, role).await {
            Ok(text) => return Ok(text),
            Err(e) if attempt < attempts => {
                warn!(
                    %role,
                    attempt,
                    transient = e.is_transient(),
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %e,
                    "generate_with_retry: retrying after failure"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!(%role, attempt, error = %e, "generate_with_retry: giving up");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::mock::ScriptedGenerator;
    use crate::prompts::{PromptLoader, TaskBuilder, TaskKind};

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::from_millis(1),
        }
    }

    fn task() -> TaskDescriptor {
        TaskBuilder::new(PromptLoader::embedded_only()).title("text").unwrap()
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let generator = ScriptedGenerator::new()
            .fail(TaskKind::Title)
            .fail(TaskKind::Title)
            .respond(TaskKind::Title, "Third Time Lucky");

        let out = generate_with_retry(&generator, &task(), AgentRole::Titler, policy(3))
            .await
            .unwrap();
        assert_eq!(out, "Third Time Lucky");
        assert_eq!(generator.calls_of(TaskKind::Title), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let generator = ScriptedGenerator::new()
            .fail(TaskKind::Title)
            .fail(TaskKind::Title)
            .respond(TaskKind::Title, "Too late");

        let result = generate_with_retry(&generator, &task(), AgentRole::Titler, policy(2)).await;
        assert!(result.is_err());
        assert_eq!(generator.calls_of(TaskKind::Title), 2);
    }

    #[tokio::test]
    async fn test_once_is_single_attempt() {
        let generator = ScriptedGenerator::new().fail(TaskKind::Title);
        let result = generate_with_retry(&generator, &task(), AgentRole::Titler, RetryPolicy::once()).await;
        assert!(result.is_err());
        assert_eq!(generator.calls_of(TaskKind::Title), 1);
    }

    #[test]
    fn test_policy_from_config_clamps_zero_attempts() {
        let config = RetryConfig {
            attempts: 0,
            delay_ms: 2000,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.attempts, 1);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }
}
