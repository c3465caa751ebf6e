//! Post ideas: the theme-grouped idea board and its tolerant parser
//!
//! Generated idea lists come back as loosely formatted text:
//!
//! ```text
//! THEME: Leadership
//! - Share a lesson from a failed project
//! - Discuss mentoring junior engineers
//! THEME: AI Trends
//! - React to a recent industry report
//! ```
//!
//! The parser never fails. Malformed output degrades to fewer or oddly named
//! themes:
//!
//! - text before the first `THEME:` marker (any case) is discarded
//! - the first non-bullet line of a segment names the theme; markdown
//!   decoration (`*`, `#`, quotes, trailing `:`) is stripped
//! - a segment that opens with a bullet has no name; if its trailing line is
//!   a stray `Theme <name>` header that name is used, otherwise the ideas land
//!   in [`UNCATEGORIZED`]
//! - every `- ` line starts a new idea; other lines are space-joined onto the
//!   idea started last, and are dropped when no idea has started yet
//! - named themes with no ideas are kept as empty buckets
//! - a theme seen twice is merged, in order

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Theme used when a segment carries ideas but no name
pub const UNCATEGORIZED: &str = "Uncategorized Ideas";

static THEME_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)theme:").expect("valid theme marker regex"));

const BULLET: &str = "- ";

/// A single post idea
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub text: String,
    pub checked: bool,
}

impl Idea {
    pub fn new(text: impl Into<String>, checked: bool) -> Self {
        Self {
            text: text.into(),
            checked,
        }
    }
}

/// Errors for idea board edits
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdeaError {
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Theme '{theme}' has no idea at position {index}")]
    UnknownIdea { theme: String, index: usize },
}

/// Ideas grouped by theme
///
/// Themes are unordered keys; ideas within a theme keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdeaBoard {
    themes: BTreeMap<String, Vec<Idea>>,
}

impl IdeaBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    /// Total number of ideas across all themes
    pub fn len(&self) -> usize {
        self.themes.values().map(Vec::len).sum()
    }

    pub fn themes(&self) -> impl Iterator<Item = (&str, &[Idea])> {
        self.themes.iter().map(|(name, ideas)| (name.as_str(), ideas.as_slice()))
    }

    pub fn theme_names(&self) -> Vec<String> {
        self.themes.keys().cloned().collect()
    }

    pub fn ideas(&self, theme: &str) -> Option<&[Idea]> {
        self.themes.get(theme).map(Vec::as_slice)
    }

    pub fn get(&self, theme: &str, index: usize) -> Result<&Idea, IdeaError> {
        self.ideas(theme)
            .ok_or_else(|| IdeaError::UnknownTheme(theme.to_string()))?
            .get(index)
            .ok_or_else(|| IdeaError::UnknownIdea {
                theme: theme.to_string(),
                index,
            })
    }

    /// Ensure a theme bucket exists, even if empty
    pub fn ensure_theme(&mut self, theme: &str) {
        self.themes.entry(theme.to_string()).or_default();
    }

    /// Append an idea to a (possibly new) theme
    pub fn push(&mut self, theme: &str, idea: Idea) {
        self.themes.entry(theme.to_string()).or_default().push(idea);
    }

    /// Flip the checked flag, returning the new value
    pub fn toggle(&mut self, theme: &str, index: usize) -> Result<bool, IdeaError> {
        let idea = self.idea_mut(theme, index)?;
        idea.checked = !idea.checked;
        Ok(idea.checked)
    }

    /// Remove one idea from its theme; the (possibly empty) bucket remains
    pub fn take(&mut self, theme: &str, index: usize) -> Result<Idea, IdeaError> {
        self.get(theme, index)?;
        let ideas = self
            .themes
            .get_mut(theme)
            .ok_or_else(|| IdeaError::UnknownTheme(theme.to_string()))?;
        Ok(ideas.remove(index))
    }

    /// Move an idea to the end of another (possibly new) theme
    pub fn move_idea(&mut self, from: &str, index: usize, to: &str) -> Result<(), IdeaError> {
        debug!(%from, index, %to, "IdeaBoard::move_idea: called");
        let idea = self.take(from, index)?;
        self.push(to, idea);
        Ok(())
    }

    /// Checked ideas, paired with their theme
    pub fn checked(&self) -> Vec<(String, Idea)> {
        self.themes
            .iter()
            .flat_map(|(theme, ideas)| {
                ideas
                    .iter()
                    .filter(|idea| idea.checked)
                    .map(move |idea| (theme.clone(), idea.clone()))
            })
            .collect()
    }

    /// Number of unchecked ideas in a theme
    pub fn unchecked_count(&self, theme: &str) -> usize {
        self.ideas(theme)
            .map(|ideas| ideas.iter().filter(|idea| !idea.checked).count())
            .unwrap_or(0)
    }

    /// Drop every checked idea
    pub fn remove_checked(&mut self) {
        for ideas in self.themes.values_mut() {
            ideas.retain(|idea| !idea.checked);
        }
    }

    /// Drop the unchecked ideas of one theme
    pub fn remove_unchecked(&mut self, theme: &str) {
        if let Some(ideas) = self.themes.get_mut(theme) {
            ideas.retain(|idea| idea.checked);
        }
    }

    /// Append every theme of `other`, in order, creating themes as needed
    pub fn merge(&mut self, other: IdeaBoard) {
        for (theme, ideas) in other.themes {
            self.themes.entry(theme).or_default().extend(ideas);
        }
    }

    /// Fold every theme of `other` into a single theme
    pub fn merge_into(&mut self, theme: &str, other: IdeaBoard) {
        let bucket = self.themes.entry(theme.to_string()).or_default();
        for (_, ideas) in other.themes {
            bucket.extend(ideas);
        }
    }

    fn idea_mut(&mut self, theme: &str, index: usize) -> Result<&mut Idea, IdeaError> {
        self.themes
            .get_mut(theme)
            .ok_or_else(|| IdeaError::UnknownTheme(theme.to_string()))?
            .get_mut(index)
            .ok_or_else(|| IdeaError::UnknownIdea {
                theme: theme.to_string(),
                index,
            })
    }
}

/// Parse generated text into an idea board
///
/// `checked` is the initial flag for every parsed idea.
pub fn parse_ideas(text: &str, checked: bool) -> IdeaBoard {
    debug!(text_len = text.len(), checked, "parse_ideas: called");
    let mut board = IdeaBoard::new();

    // The first piece is the preamble before any marker
    for segment in THEME_MARKER.split(text).skip(1) {
        parse_segment(segment, checked, &mut board);
    }

    debug!(themes = board.themes.len(), ideas = board.len(), "parse_ideas: done");
    board
}

fn parse_segment(segment: &str, checked: bool, board: &mut IdeaBoard) {
    let lines: Vec<&str> = segment.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let Some(first) = lines.first() else {
        return;
    };

    let (theme, body) = if is_bullet(first) {
        match trailing_theme_name(&lines) {
            Some(name) => (name, &lines[..lines.len() - 1]),
            None => (UNCATEGORIZED.to_string(), &lines[..]),
        }
    } else {
        (clean_theme_name(first), &lines[1..])
    };

    let ideas = board.themes.entry(theme).or_default();
    let mut started = false;
    for line in body {
        if let Some(text) = line.strip_prefix(BULLET) {
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            ideas.push(Idea::new(text, checked));
            started = true;
        } else if started && let Some(last) = ideas.last_mut() {
            last.text.push(' ');
            last.text.push_str(line);
        }
    }
}

fn is_bullet(line: &str) -> bool {
    line.starts_with(BULLET)
}

/// A stray `Theme <name>` line closing a nameless segment
fn trailing_theme_name(lines: &[&str]) -> Option<String> {
    let last = lines.last()?;
    if lines.len() < 2 || is_bullet(last) {
        return None;
    }
    let stripped = last.trim_start_matches(['*', '#', ' ']);
    let head = stripped.get(..5)?;
    if !head.eq_ignore_ascii_case("theme") {
        return None;
    }
    let rest = &stripped[5..];
    if !rest.is_empty() && !rest.starts_with([' ', '-', '\u{2013}', '*']) {
        return None;
    }
    let name = clean_theme_name(rest);
    (name != UNCATEGORIZED).then_some(name)
}

fn clean_theme_name(raw: &str) -> String {
    let name = raw.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '*' | '#' | '"' | '\'' | '`' | ':' | '-' | '\u{2013}')
    });
    if name.is_empty() {
        UNCATEGORIZED.to_string()
    } else {
        name.to_string()
    }
}

/// Render a board back into `THEME:` / `- ` text
pub fn render_ideas(board: &IdeaBoard) -> String {
    let mut out = String::new();
    for (theme, ideas) in board.themes() {
        out.push_str("THEME: ");
        out.push_str(theme);
        out.push('\n');
        for idea in ideas {
            out.push_str(BULLET);
            out.push_str(&idea.text);
            out.push('\n');
        }
    }
    out
}

/// Render a flat list of ideas as bullets
pub fn render_bullets<'a>(ideas: impl IntoIterator<Item = &'a Idea>) -> String {
    ideas
        .into_iter()
        .map(|idea| format!("{}{}\n", BULLET, idea.text))
        .collect()
}
