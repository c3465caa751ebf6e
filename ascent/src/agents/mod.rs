//! Agent invocation
//!
//! A [`Generator`] executes a [`TaskDescriptor`](crate::prompts::TaskDescriptor)
//! as one of the fixed [`AgentRole`]s and returns the raw output text. The
//! production implementation is [`AgentInvoker`], which binds each role to an
//! LLM client once at startup.

mod invoker;
mod retry;
mod role;

pub use invoker::{AgentInvoker, Generator, InvocationError};
pub use retry::{RetryPolicy, generate_with_retry};
pub use role::{AgentRole, Persona};

#[cfg(test)]
pub use invoker::mock;
