//! Prompt Template System
//!
//! Template loading chain:
//! 1. `{prompts.dir}/{name}.pmt` (user override)
//! 2. Embedded fallback compiled from `ascent/prompts/`
//!
//! Templates use Handlebars syntax for variable substitution. The
//! [`TaskBuilder`] turns stage inputs into [`TaskDescriptor`]s.

pub mod embedded;
mod loader;
mod task;

pub use loader::{PromptError, PromptLoader};
pub use task::{DayTheme, StrategyInputs, TaskBuilder, TaskDescriptor, TaskKind, extract_day_themes};
