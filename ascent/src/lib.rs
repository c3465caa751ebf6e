//! Ascent AI - guided personal-branding content assistant
//!
//! A conversational workflow that takes a user from onboarding answers to a
//! content strategy, post ideas and reviewed drafts, with each generation step
//! handled by a role-specific LLM agent.

pub mod agents;
pub mod cli;
pub mod config;
pub mod export;
pub mod extract;
pub mod ideas;
pub mod llm;
pub mod prompts;
pub mod repl;
pub mod session;
pub mod workflow;

pub use agents::{AgentInvoker, AgentRole, Generator, InvocationError, RetryPolicy};
pub use config::Config;
pub use ideas::{Idea, IdeaBoard, parse_ideas, render_ideas};
pub use session::{Session, SessionId, SessionStore};
pub use workflow::{Input, Stage, StepOutcome, Workflow, WorkflowError, is_approval};
