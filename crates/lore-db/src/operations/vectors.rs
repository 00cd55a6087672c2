//! Vector store operations for semantic search.

use super::chunks::{row_to_chunk, CHUNK_COLUMNS};
use super::extractions::{row_to_extraction, ExtractionFilter, EXTRACTION_COLUMNS};
use crate::database::Database;
use crate::error::{DbError, DbResult};
use lore_core::{Chunk, Extraction};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};
use tracing::debug;

/// Which kind of record a vector belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    Chunk,
    Extraction,
}

impl OwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Chunk => "chunk",
            OwnerKind::Extraction => "extraction",
        }
    }

    fn table(&self) -> &'static str {
        match self {
            OwnerKind::Chunk => "chunks",
            OwnerKind::Extraction => "extractions",
        }
    }
}

/// A chunk with a relevance score.
#[derive(Debug, Clone)]
pub struct ChunkMatch {
    pub chunk: Chunk,
    pub score: f32,
}

/// An extraction with a relevance score.
#[derive(Debug, Clone)]
pub struct ExtractionMatch {
    pub extraction: Extraction,
    pub score: f32,
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    dot_product / denominator
}

fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_to_vector(bytes: &[u8], dimensions: usize) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .take(dimensions)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

impl Database {
    /// Store (or replace) the vector for a chunk or extraction.
    pub fn store_vector(
        &self,
        kind: OwnerKind,
        owner_id: &str,
        vector: &[f32],
        model: &str,
    ) -> DbResult<()> {
        let conn = self.conn()?;

        let exists: Option<i64> = conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE id = ?1", kind.table()),
                params![owner_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(DbError::NotFound(format!(
                "Cannot store vector, {} not found: {}",
                kind.as_str(),
                owner_id
            )));
        }

        conn.execute(
            r#"
            INSERT OR REPLACE INTO vectors (owner_kind, owner_id, vector, model, dimensions)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                kind.as_str(),
                owner_id,
                vector_to_bytes(vector),
                model,
                vector.len() as i64
            ],
        )?;
        Ok(())
    }

    /// Get the stored vector for a chunk or extraction, if any.
    pub fn get_vector(&self, kind: OwnerKind, owner_id: &str) -> DbResult<Option<Vec<f32>>> {
        let conn = self.conn()?;
        let row: Option<(Vec<u8>, i64)> = conn
            .query_row(
                "SELECT vector, dimensions FROM vectors WHERE owner_kind = ?1 AND owner_id = ?2",
                params![kind.as_str(), owner_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(row.map(|(bytes, dims)| bytes_to_vector(&bytes, dims as usize)))
    }

    /// Find chunks similar to `query_vector`.
    ///
    /// Brute-force over every stored chunk vector, which is fine for a
    /// personal library.
    pub fn vector_search_chunks(
        &self,
        query_vector: &[f32],
        source_id: Option<&str>,
        limit: usize,
        min_similarity: f32,
    ) -> DbResult<Vec<ChunkMatch>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}, v.vector, v.dimensions
            FROM vectors v
            JOIN chunks c ON c.id = v.owner_id
            WHERE v.owner_kind = 'chunk' AND (?1 IS NULL OR c.source_id = ?1)
            "#,
            CHUNK_COLUMNS
        ))?;

        let rows = stmt.query_map(params![source_id], |row| {
            let chunk = row_to_chunk(row)?;
            let bytes: Vec<u8> = row.get(7)?;
            let dims: i64 = row.get(8)?;
            Ok((chunk, bytes, dims))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (chunk, bytes, dims) = row?;
            let score = cosine_similarity(query_vector, &bytes_to_vector(&bytes, dims as usize));
            if score >= min_similarity {
                results.push(ChunkMatch { chunk, score });
            }
        }

        results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.chunk.id.cmp(&b.chunk.id)));
        results.truncate(limit);
        debug!("Vector search matched {} chunks", results.len());
        Ok(results)
    }

    /// Find extractions similar to `query_vector`, within a filter.
    pub fn vector_search_extractions(
        &self,
        query_vector: &[f32],
        filter: &ExtractionFilter,
        min_similarity: f32,
    ) -> DbResult<Vec<ExtractionMatch>> {
        let conn = self.conn()?;
        let mut values: Vec<Value> = Vec::new();
        let conditions = filter.sql_conditions(&mut values);

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}, v.vector, v.dimensions
            FROM vectors v
            JOIN extractions e ON e.id = v.owner_id
            WHERE v.owner_kind = 'extraction'{}
            "#,
            EXTRACTION_COLUMNS, conditions
        ))?;

        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            let extraction = row_to_extraction(row)?;
            let bytes: Vec<u8> = row.get(8)?;
            let dims: i64 = row.get(9)?;
            Ok((extraction, bytes, dims))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (extraction, bytes, dims) = row?;
            let score = cosine_similarity(query_vector, &bytes_to_vector(&bytes, dims as usize));
            if score >= min_similarity {
                results.push(ExtractionMatch { extraction, score });
            }
        }

        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.extraction.id.cmp(&b.extraction.id))
        });
        results.truncate(filter.limit.unwrap_or(100));
        debug!("Vector search matched {} extractions", results.len());
        Ok(results)
    }

    /// Chunks that don't have a vector yet.
    ///
    /// `offset` skips records the caller already tried in this pass.
    pub fn unembedded_chunks(&self, limit: usize, offset: usize) -> DbResult<Vec<Chunk>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}
            FROM chunks c
            LEFT JOIN vectors v ON v.owner_kind = 'chunk' AND v.owner_id = c.id
            WHERE v.owner_id IS NULL
            ORDER BY c.source_id, c.chunk_index
            LIMIT ?1 OFFSET ?2
            "#,
            CHUNK_COLUMNS
        ))?;

        let chunks = stmt.query_map(params![limit as i64, offset as i64], row_to_chunk)?;
        chunks.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Extractions that don't have a vector yet.
    pub fn unembedded_extractions(&self, limit: usize, offset: usize) -> DbResult<Vec<Extraction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}
            FROM extractions e
            LEFT JOIN vectors v ON v.owner_kind = 'extraction' AND v.owner_id = e.id
            WHERE v.owner_id IS NULL
            ORDER BY e.created_at, e.id
            LIMIT ?1 OFFSET ?2
            "#,
            EXTRACTION_COLUMNS
        ))?;

        let extractions = stmt.query_map(params![limit as i64, offset as i64], row_to_extraction)?;
        extractions.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Number of stored vectors of a kind.
    pub fn vector_count(&self, kind: OwnerKind) -> DbResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM vectors WHERE owner_kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lore_core::{ExtractionContent, ExtractionDraft, ExtractionType, Source, SourceType};

    fn pattern(problem: &str, chunk: &Chunk) -> Extraction {
        Extraction::from_draft(
            ExtractionDraft {
                title: problem.to_string(),
                topics: vec!["resilience".to_string()],
                confidence: 0.9,
                content: ExtractionContent::Pattern {
                    problem: problem.to_string(),
                    solution: "Fail fast".to_string(),
                    applicability: String::new(),
                    consequences: String::new(),
                },
            },
            chunk,
        )
    }

    fn setup() -> (Database, Source, Chunk, Chunk) {
        let db = Database::open_in_memory().unwrap();
        let source = Source::new(SourceType::Book, "Release It");
        db.create_source(&source).unwrap();
        let c1 = Chunk::new(source.id.clone(), 0, "First chunk about timeouts");
        let c2 = Chunk::new(source.id.clone(), 1, "Second chunk about caching");
        db.create_chunks(&[c1.clone(), c2.clone()]).unwrap();
        (db, source, c1, c2)
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.0001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.0001);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 0.0001);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_store_and_get_vector() {
        let (db, _source, c1, _c2) = setup();
        db.store_vector(OwnerKind::Chunk, &c1.id, &[0.5, -1.25, 3.0], "test-model")
            .unwrap();

        assert_eq!(
            db.get_vector(OwnerKind::Chunk, &c1.id).unwrap(),
            Some(vec![0.5, -1.25, 3.0])
        );
        assert_eq!(db.get_vector(OwnerKind::Extraction, &c1.id).unwrap(), None);

        // Replacing keeps a single row.
        db.store_vector(OwnerKind::Chunk, &c1.id, &[1.0], "test-model").unwrap();
        assert_eq!(db.vector_count(OwnerKind::Chunk).unwrap(), 1);
    }

    #[test]
    fn test_store_vector_requires_owner() {
        let (db, ..) = setup();
        let result = db.store_vector(OwnerKind::Extraction, "missing", &[1.0], "m");
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_vector_search_chunks() {
        let (db, _source, c1, c2) = setup();
        db.store_vector(OwnerKind::Chunk, &c1.id, &[1.0, 0.0, 0.0, 0.0], "m").unwrap();
        db.store_vector(OwnerKind::Chunk, &c2.id, &[0.0, 1.0, 0.0, 0.0], "m").unwrap();

        let results = db
            .vector_search_chunks(&[0.9, 0.1, 0.0, 0.0], None, 10, 0.0)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.id, c1.id);

        let strict = db
            .vector_search_chunks(&[0.9, 0.1, 0.0, 0.0], None, 10, 0.5)
            .unwrap();
        assert_eq!(strict.len(), 1);
    }

    #[test]
    fn test_vector_search_extractions_with_filter() {
        let (db, source, c1, c2) = setup();
        let p1 = pattern("Slow responses", &c1);
        let p2 = pattern("Cache stampede", &c2);
        db.create_extractions(&[p1.clone(), p2.clone()]).unwrap();
        db.store_vector(OwnerKind::Extraction, &p1.id, &[0.0, 1.0], "m").unwrap();
        db.store_vector(OwnerKind::Extraction, &p2.id, &[1.0, 0.0], "m").unwrap();

        let filter = ExtractionFilter::new()
            .with_type(ExtractionType::Pattern)
            .with_source(source.id.clone());
        let results = db.vector_search_extractions(&[1.0, 0.1], &filter, 0.0).unwrap();
        assert_eq!(results[0].extraction.id, p2.id);

        let none = db
            .vector_search_extractions(
                &[1.0, 0.1],
                &ExtractionFilter::new().with_type(ExtractionType::Warning),
                0.0,
            )
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_unembedded_and_cascade() {
        let (db, source, c1, c2) = setup();
        let p1 = pattern("Slow responses", &c1);
        db.create_extractions(std::slice::from_ref(&p1)).unwrap();
        db.store_vector(OwnerKind::Chunk, &c1.id, &[1.0], "m").unwrap();

        let missing = db.unembedded_chunks(10, 0).unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id, c2.id);
        assert!(db.unembedded_chunks(10, 1).unwrap().is_empty());
        assert_eq!(db.unembedded_extractions(10, 0).unwrap().len(), 1);

        db.store_vector(OwnerKind::Extraction, &p1.id, &[1.0], "m").unwrap();
        assert!(db.unembedded_extractions(10, 0).unwrap().is_empty());

        // Deleting the source removes every vector it owned.
        db.delete_source(&source.id).unwrap();
        assert_eq!(db.vector_count(OwnerKind::Chunk).unwrap(), 0);
        assert_eq!(db.vector_count(OwnerKind::Extraction).unwrap(), 0);
    }
}
