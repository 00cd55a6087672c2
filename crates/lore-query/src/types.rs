//! Request and result types for the query service.

use lore_core::{ChunkPosition, Extraction, ExtractionType, Source};
use serde::Serialize;
use std::collections::BTreeMap;

/// What a search hit points at. Extractions sort before chunks on equal scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HitKind {
    Extraction,
    Chunk,
}

/// A search over extractions and, optionally, raw chunks.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    /// Only these extraction types; empty means all.
    pub types: Vec<ExtractionType>,
    /// Source id or unique prefix.
    pub source_id: Option<String>,
    pub topic: Option<String>,
    /// Falls back to the configured default; clamped to `[1, MAX_LIMIT]`.
    pub limit: Option<usize>,
    /// Also search raw chunks. Ignored when a type or topic filter is set.
    pub include_chunks: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            types: Vec::new(),
            source_id: None,
            topic: None,
            limit: None,
            include_chunks: true,
        }
    }

    pub fn with_types(mut self, types: Vec<ExtractionType>) -> Self {
        self.types = types;
        self
    }

    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn include_chunks(mut self, include: bool) -> Self {
        self.include_chunks = include;
        self
    }
}

/// One ranked search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub kind: HitKind,
    pub id: String,
    pub source_id: String,
    pub source_title: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_type: Option<ExtractionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    pub snippet: String,
    pub position: ChunkPosition,
}

/// An extraction with the context needed to cite it.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionDetail {
    #[serde(flatten)]
    pub extraction: Extraction,
    pub extraction_type: ExtractionType,
    pub source_title: String,
    pub position: ChunkPosition,
}

/// A source with its record counts.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    #[serde(flatten)]
    pub source: Source,
    pub chunk_count: i64,
    pub extraction_count: i64,
}

/// What one source says about a topic.
#[derive(Debug, Clone, Serialize)]
pub struct SourceComparison {
    pub source_id: String,
    pub title: String,
    pub authors: Vec<String>,
    /// Extraction type name to number of matching extractions.
    pub type_counts: BTreeMap<String, usize>,
    pub extractions: Vec<ExtractionDetail>,
}

/// Side-by-side view of several sources on one topic.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub topic: String,
    pub sources: Vec<SourceComparison>,
    /// Topic tags that appear in every compared source.
    pub shared_topics: Vec<String>,
}
