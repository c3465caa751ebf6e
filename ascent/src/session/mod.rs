//! Sessions and the in-memory store

mod model;
mod store;

pub use model::{
    ChatMessage, ContextField, DraftVersion, PLACEHOLDER_TITLE, SEED_MESSAGE, Session, SessionId, StrategyVersion,
};
pub use store::{SessionStore, StoreError};
