//! Markdown exports of the current strategy and draft
//!
//! File names derive from the session title with spaces turned into
//! underscores; drafts also carry a local timestamp.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{debug, info};

use crate::session::Session;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No strategy to export yet")]
    NoStrategy,

    #[error("No draft to export yet")]
    NoDraft,

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Title as a file name stem: spaces become underscores, path characters are dropped
pub fn file_stem(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => None,
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();
    if stem.is_empty() { "session".to_string() } else { stem }
}

pub fn strategy_filename(title: &str) -> String {
    format!("{}_strategy.md", file_stem(title))
}

pub fn draft_filename(title: &str, at: DateTime<Local>) -> String {
    format!("{}_post_{}.md", file_stem(title), at.format("%Y%m%d-%H%M%S"))
}

/// Write the current strategy into `dir`
pub fn export_strategy(session: &Session, dir: &Path) -> Result<PathBuf, ExportError> {
    debug!(id = %session.id(), dir = %dir.display(), "export_strategy: called");
    let strategy = session.current_strategy().ok_or(ExportError::NoStrategy)?;
    write(&dir.join(strategy_filename(&session.title)), &strategy.content)
}

/// Write the current draft into `dir`, stamped with `at`
pub fn export_draft(session: &Session, dir: &Path, at: DateTime<Local>) -> Result<PathBuf, ExportError> {
    debug!(id = %session.id(), dir = %dir.display(), "export_draft: called");
    let draft = session.draft.as_deref().ok_or(ExportError::NoDraft)?;
    write(&dir.join(draft_filename(&session.title, at)), draft)
}

fn write(path: &Path, content: &str) -> Result<PathBuf, ExportError> {
    let wrap = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(wrap)?;
    }
    std::fs::write(path, content).map_err(wrap)?;
    info!(path = %path.display(), bytes = content.len(), "Exported");
    Ok(path.to_path_buf())
}
