//! Document text extraction
//!
//! Turns uploaded documents (PDF, plain text, markdown) into plain text. A
//! batch never aborts on a bad file: failures are collected next to the text
//! of the files that did extract.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

/// Errors for a single document
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported document type: {0}")]
    Unsupported(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Document is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supported document kinds, decided by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
    Markdown,
}

impl DocumentKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "text" => Some(Self::Text),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }
}

/// An uploaded document: its original file name and raw bytes
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a document from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ExtractionError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// Result of extracting a batch
#[derive(Debug, Default)]
pub struct BatchExtraction {
    /// Combined text of every document that extracted
    pub text: String,

    /// Documents that failed, with the reason
    pub failures: Vec<(String, ExtractionError)>,
}

impl BatchExtraction {
    /// True when no document contributed any text
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Extract plain text from one document
pub fn extract_text(doc: &UploadedDocument) -> Result<String, ExtractionError> {
    debug!(name = %doc.name, size = doc.bytes.len(), "extract_text: called");
    match DocumentKind::from_name(&doc.name) {
        Some(DocumentKind::Pdf) => extract_pdf(&doc.bytes),
        Some(DocumentKind::Text) | Some(DocumentKind::Markdown) => Ok(String::from_utf8(doc.bytes.clone())?),
        None => Err(ExtractionError::Unsupported(doc.name.clone())),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    let document = lopdf::Document::load_mem(bytes)?;
    let mut text = String::new();
    for page_number in document.get_pages().keys() {
        text.push_str(&document.extract_text(&[*page_number])?);
        text.push_str("\n\n");
    }
    Ok(text)
}

/// Extract every document in a batch, continuing past failures
pub fn extract_batch(docs: &[UploadedDocument]) -> BatchExtraction {
    debug!(count = docs.len(), "extract_batch: called");
    let mut batch = BatchExtraction::default();
    for doc in docs {
        match extract_text(doc) {
            Ok(text) => {
                batch.text.push_str(&text);
                batch.text.push_str("\n\n");
            }
            Err(e) => {
                warn!(name = %doc.name, error = %e, "extract_batch: document failed");
                batch.failures.push((doc.name.clone(), e));
            }
        }
    }
    batch
}
