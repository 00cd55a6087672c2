//! Plain text document parser.

use super::{title_from_path, DocumentParser, ParsedDocument, Section};
use crate::error::{IngestError, IngestResult};
use lore_core::ChunkPosition;
use std::path::Path;

/// Parser for plain text notes. The whole file is one section.
pub struct TextParser;

impl TextParser {
    /// Create a new text parser.
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for TextParser {
    fn parse(&self, path: &Path) -> IngestResult<ParsedDocument> {
        if !path.exists() {
            return Err(IngestError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| IngestError::ParseError {
            path: path.to_path_buf(),
            message: format!("not valid UTF-8 text: {}", e),
        })?;

        let metadata = serde_json::json!({
            "format": "text",
            "length": content.len(),
            "lines": content.lines().count(),
        });

        let trimmed = content.trim();
        let sections = if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![Section::new(ChunkPosition::new(), trimmed)]
        };

        let doc = ParsedDocument::new(sections).with_metadata(metadata);
        match title_from_path(path) {
            Some(t) => Ok(doc.with_title(t)),
            None => Ok(doc),
        }
    }

    fn extensions(&self) -> &[&str] {
        &["txt", "text", "rst", "org"]
    }
}
