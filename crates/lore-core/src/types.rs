//! Core domain types for Lore.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for sources.
pub type SourceId = String;

/// Unique identifier for chunks.
pub type ChunkId = String;

/// Unique identifier for extractions.
pub type ExtractionId = String;

/// Generate a new unique ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Kind of source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Book,
    Paper,
    Article,
    Documentation,
    Notes,
    Other,
}

impl SourceType {
    pub const ALL: [SourceType; 6] = [
        SourceType::Book,
        SourceType::Paper,
        SourceType::Article,
        SourceType::Documentation,
        SourceType::Notes,
        SourceType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Book => "book",
            SourceType::Paper => "paper",
            SourceType::Article => "article",
            SourceType::Documentation => "documentation",
            SourceType::Notes => "notes",
            SourceType::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "book" => Some(SourceType::Book),
            "paper" => Some(SourceType::Paper),
            "article" => Some(SourceType::Article),
            "documentation" | "docs" => Some(SourceType::Documentation),
            "notes" | "note" => Some(SourceType::Notes),
            "other" => Some(SourceType::Other),
            _ => None,
        }
    }

    /// Guess the source type from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(SourceType::Book),
            "md" | "markdown" | "mdown" | "mkd" => Some(SourceType::Documentation),
            "txt" | "text" | "rst" | "org" => Some(SourceType::Notes),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ingestion status of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IngestionStatus {
    #[default]
    Pending,
    Processing,
    Complete,
    Failed,
}

impl IngestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStatus::Pending => "pending",
            IngestionStatus::Processing => "processing",
            IngestionStatus::Complete => "complete",
            IngestionStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(IngestionStatus::Pending),
            "processing" => Some(IngestionStatus::Processing),
            "complete" => Some(IngestionStatus::Complete),
            "failed" => Some(IngestionStatus::Failed),
            _ => None,
        }
    }

    /// Whether a source in this status may move to `next`.
    pub fn can_transition_to(&self, next: IngestionStatus) -> bool {
        use IngestionStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, Complete)
                | (Processing, Failed)
                | (Failed, Processing)
                | (Complete, Processing)
        )
    }
}

impl std::fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A book, paper or document in the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub title: String,
    pub authors: Vec<String>,
    pub source_type: SourceType,
    pub path: Option<String>,
    pub content_hash: Option<String>,
    pub status: IngestionStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ingested_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
}

impl Source {
    pub fn new(source_type: SourceType, title: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            authors: Vec::new(),
            source_type,
            path: None,
            content_hash: None,
            status: IngestionStatus::Pending,
            error: None,
            created_at: Utc::now(),
            ingested_at: None,
            metadata: serde_json::json!({}),
        }
    }

    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }

    /// Move to a new status, rejecting transitions the lifecycle does not allow.
    pub fn transition(&mut self, next: IngestionStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn start_processing(&mut self) -> Result<()> {
        self.transition(IngestionStatus::Processing)?;
        self.error = None;
        Ok(())
    }

    pub fn mark_complete(&mut self) -> Result<()> {
        self.transition(IngestionStatus::Complete)?;
        self.ingested_at = Some(Utc::now());
        Ok(())
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<()> {
        self.transition(IngestionStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }

    /// Authors joined for display.
    pub fn author_line(&self) -> String {
        if self.authors.is_empty() {
            "unknown".to_string()
        } else {
            self.authors.join(", ")
        }
    }
}

/// Where a chunk sits inside its source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPosition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl ChunkPosition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chapter(mut self, chapter: impl Into<String>) -> Self {
        self.chapter = Some(chapter.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.chapter.is_none() && self.section.is_none() && self.page.is_none()
    }
}

impl std::fmt::Display for ChunkPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(chapter) = &self.chapter {
            parts.push(chapter.clone());
        }
        if let Some(section) = &self.section {
            parts.push(section.clone());
        }
        if let Some(page) = self.page {
            parts.push(format!("p. {}", page));
        }
        if parts.is_empty() {
            write!(f, "-")
        } else {
            write!(f, "{}", parts.join(" / "))
        }
    }
}

/// A contiguous span of source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub source_id: SourceId,
    pub chunk_index: i32,
    pub content: String,
    pub position: ChunkPosition,
}

impl Chunk {
    pub fn new(source_id: SourceId, chunk_index: i32, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            source_id,
            chunk_index,
            content: content.into(),
            position: ChunkPosition::default(),
        }
    }

    pub fn with_position(mut self, position: ChunkPosition) -> Self {
        self.position = position;
        self
    }
}

/// Statistics about the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_sources: i64,
    pub sources_by_status: HashMap<String, i64>,
    pub total_chunks: i64,
    pub total_extractions: i64,
    pub extractions_by_type: HashMap<String, i64>,
    pub embedded_chunks: i64,
    pub embedded_extractions: i64,
    pub total_topics: i64,
    pub database_size_bytes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_from_extension() {
        assert_eq!(SourceType::from_extension("pdf"), Some(SourceType::Book));
        assert_eq!(SourceType::from_extension("MD"), Some(SourceType::Documentation));
        assert_eq!(SourceType::from_extension("txt"), Some(SourceType::Notes));
        assert_eq!(SourceType::from_extension("mp4"), None);
    }

    #[test]
    fn test_source_lifecycle() {
        let mut source = Source::new(SourceType::Book, "Designing Systems")
            .with_authors(vec!["A. Author".to_string()])
            .with_path("/books/systems.pdf");

        assert_eq!(source.status, IngestionStatus::Pending);
        source.start_processing().unwrap();
        source.mark_complete().unwrap();

        assert_eq!(source.status, IngestionStatus::Complete);
        assert!(source.ingested_at.is_some());
    }

    #[test]
    fn test_failed_source_can_retry() {
        let mut source = Source::new(SourceType::Paper, "Paper");
        source.start_processing().unwrap();
        source.mark_failed("parse error").unwrap();
        assert_eq!(source.error.as_deref(), Some("parse error"));

        source.start_processing().unwrap();
        assert_eq!(source.status, IngestionStatus::Processing);
        assert!(source.error.is_none());
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let mut source = Source::new(SourceType::Notes, "Notes");
        assert!(source.mark_complete().is_err());
        assert!(source.mark_failed("nope").is_err());
        assert_eq!(source.status, IngestionStatus::Pending);
    }

    #[test]
    fn test_position_display() {
        let position = ChunkPosition::new()
            .with_chapter("Chapter 3")
            .with_section("Caching")
            .with_page(42);
        assert_eq!(position.to_string(), "Chapter 3 / Caching / p. 42");
        assert_eq!(ChunkPosition::new().to_string(), "-");
    }
}
