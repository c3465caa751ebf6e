//! In-memory session store
//!
//! Holds every session for the lifetime of the process, plus a pointer to
//! the active one. There is a single writer (the REPL loop), so no locking.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use super::{Session, SessionId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session id prefix '{0}' matches more than one session")]
    Ambiguous(String),

    #[error("No active session")]
    NoActive,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
    /// Insertion order, oldest first
    order: Vec<SessionId>,
    active: Option<SessionId>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh session and return its id
    pub fn create(&mut self) -> SessionId {
        let session = Session::new();
        let id = session.id().clone();
        debug!(%id, "SessionStore::create: called");
        self.order.push(id.clone());
        self.sessions.insert(id.clone(), session);
        id
    }

    /// Insert an existing session, replacing any with the same id
    pub fn insert(&mut self, session: Session) -> SessionId {
        let id = session.id().clone();
        if self.sessions.insert(id.clone(), session).is_none() {
            self.order.push(id.clone());
        }
        id
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, id: &SessionId) -> Result<&Session, StoreError> {
        self.sessions
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: &SessionId) -> Result<&mut Session, StoreError> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn rename(&mut self, id: &SessionId, title: impl Into<String>) -> Result<(), StoreError> {
        let title = title.into();
        debug!(%id, %title, "SessionStore::rename: called");
        self.get_mut(id)?.title = title;
        Ok(())
    }

    /// Remove a session; clears the active pointer if it pointed here
    pub fn delete(&mut self, id: &SessionId) -> Result<Session, StoreError> {
        debug!(%id, "SessionStore::delete: called");
        let session = self
            .sessions
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.order.retain(|other| other != id);
        if self.active.as_ref() == Some(id) {
            info!(%id, "Deleted the active session");
            self.active = None;
        }
        Ok(session)
    }

    /// Sessions, most recently created first
    pub fn list_recent(&self) -> Vec<&Session> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.sessions.get(id))
            .collect()
    }

    /// Resolve a full id or a unique prefix/suffix of one
    pub fn resolve(&self, needle: &str) -> Result<SessionId, StoreError> {
        let exact = SessionId::from_string(needle);
        if self.sessions.contains_key(&exact) {
            return Ok(exact);
        }
        let mut matches = self
            .order
            .iter()
            .filter(|id| id.as_str().starts_with(needle) || id.as_str().ends_with(needle));
        match (matches.next(), matches.next()) {
            (Some(id), None) if !needle.is_empty() => Ok(id.clone()),
            (Some(_), Some(_)) => Err(StoreError::Ambiguous(needle.to_string())),
            _ => Err(StoreError::NotFound(needle.to_string())),
        }
    }

    pub fn set_active(&mut self, id: &SessionId) -> Result<(), StoreError> {
        if !self.sessions.contains_key(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!(%id, "SessionStore::set_active: called");
        self.active = Some(id.clone());
        Ok(())
    }

    pub fn active_id(&self) -> Option<&SessionId> {
        self.active.as_ref()
    }

    pub fn active(&self) -> Result<&Session, StoreError> {
        let id = self.active.as_ref().ok_or(StoreError::NoActive)?;
        self.get(id)
    }

    pub fn active_mut(&mut self) -> Result<&mut Session, StoreError> {
        let id = self.active.clone().ok_or(StoreError::NoActive)?;
        self.get_mut(&id)
    }
}
