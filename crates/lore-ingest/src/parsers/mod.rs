//! Document parsers for the supported source formats.

mod markdown;
mod pdf;
mod text;

pub use markdown::MarkdownParser;
pub use pdf::PdfParser;
pub use text::TextParser;

use crate::error::{IngestError, IngestResult};
use lore_core::ChunkPosition;
use std::path::Path;

/// A run of text that shares one position in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub position: ChunkPosition,
    pub text: String,
}

impl Section {
    pub fn new(position: ChunkPosition, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
        }
    }
}

/// Parsed document content.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Document title (if extracted).
    pub title: Option<String>,
    /// Text in document order, split wherever the position changes.
    pub sections: Vec<Section>,
    /// Extracted metadata.
    pub metadata: serde_json::Value,
}

impl ParsedDocument {
    pub fn new(sections: Vec<Section>) -> Self {
        Self {
            title: None,
            sections,
            metadata: serde_json::json!({}),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Total characters of text across sections.
    pub fn text_len(&self) -> usize {
        self.sections.iter().map(|s| s.text.chars().count()).sum()
    }
}

/// Trait for document parsers.
pub trait DocumentParser: Send + Sync {
    /// Parse a file at the given path.
    fn parse(&self, path: &Path) -> IngestResult<ParsedDocument>;

    /// Get the supported file extensions.
    fn extensions(&self) -> &[&str];

    /// Check if this parser supports the given extension.
    fn supports(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

fn parsers() -> [Box<dyn DocumentParser>; 3] {
    [
        Box::new(PdfParser::new()),
        Box::new(MarkdownParser::new()),
        Box::new(TextParser::new()),
    ]
}

/// Whether any parser handles files with this extension.
pub fn is_supported(path: &Path) -> bool {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    parsers().iter().any(|p| p.supports(extension))
}

/// Parse a file based on its extension.
pub fn parse_file(path: &Path) -> IngestResult<ParsedDocument> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    parsers()
        .into_iter()
        .find(|p| p.supports(extension))
        .ok_or_else(|| {
            IngestError::UnsupportedFileType(if extension.is_empty() {
                "unknown".to_string()
            } else {
                extension.to_string()
            })
        })?
        .parse(path)
}

/// File stem as a fallback title.
pub(crate) fn title_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
