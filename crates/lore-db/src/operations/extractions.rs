//! Extraction CRUD operations.

use super::vectors::ExtractionMatch;
use super::{parse_timestamp, resolve_id};
use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::fts::bm25_score;
use lore_core::{Extraction, ExtractionType};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

pub(crate) const EXTRACTION_COLUMNS: &str =
    "e.id, e.source_id, e.chunk_id, e.title, e.topics, e.confidence, e.content, e.created_at";

/// Narrows which extractions a listing or search considers.
#[derive(Debug, Clone, Default)]
pub struct ExtractionFilter {
    /// Only these types; empty means all types.
    pub types: Vec<ExtractionType>,
    pub source_id: Option<String>,
    /// Normalized topic tag that must be present.
    pub topic: Option<String>,
    pub limit: Option<usize>,
}

impl ExtractionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, extraction_type: ExtractionType) -> Self {
        self.types.push(extraction_type);
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

    /// SQL conditions (each prefixed with `AND`) over the `e` alias.
    pub(crate) fn sql_conditions(&self, values: &mut Vec<Value>) -> String {
        let mut sql = String::new();

        if !self.types.is_empty() {
            let placeholders = vec!["?"; self.types.len()].join(", ");
            sql.push_str(&format!(" AND e.extraction_type IN ({})", placeholders));
            values.extend(self.types.iter().map(|t| Value::Text(t.as_str().to_string())));
        }

        if let Some(source_id) = &self.source_id {
            sql.push_str(" AND e.source_id = ?");
            values.push(Value::Text(source_id.clone()));
        }

        if let Some(topic) = &self.topic {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM extraction_topics t WHERE t.extraction_id = e.id AND t.topic = ?)",
            );
            values.push(Value::Text(topic.clone()));
        }

        sql
    }
}

pub(crate) fn row_to_extraction(row: &Row) -> rusqlite::Result<Extraction> {
    let topics_str: String = row.get(4)?;
    let confidence: f64 = row.get(5)?;
    let content_str: String = row.get(6)?;
    let created_at_str: String = row.get(7)?;

    let content = serde_json::from_str(&content_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

    Ok(Extraction {
        id: row.get(0)?,
        source_id: row.get(1)?,
        chunk_id: row.get(2)?,
        title: row.get(3)?,
        topics: serde_json::from_str(&topics_str).unwrap_or_default(),
        confidence: confidence as f32,
        content,
        created_at: parse_timestamp(&created_at_str),
    })
}

impl Database {
    /// Store extractions and their topic tags in one transaction.
    ///
    /// Fails with [`DbError::Integrity`] if an extraction names a source that
    /// does not own its chunk; nothing is written in that case.
    pub fn create_extractions(&self, extractions: &[Extraction]) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        {
            let mut owner_stmt = tx.prepare("SELECT source_id FROM chunks WHERE id = ?1")?;
            let mut insert_stmt = tx.prepare(
                r#"
                INSERT INTO extractions
                    (id, source_id, chunk_id, extraction_type, title, topics, confidence, content, search_text, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )?;
            let mut topic_stmt = tx.prepare(
                "INSERT OR IGNORE INTO extraction_topics (extraction_id, topic) VALUES (?1, ?2)",
            )?;

            for extraction in extractions {
                let owner: Option<String> = owner_stmt
                    .query_row(params![extraction.chunk_id], |row| row.get(0))
                    .optional()?;

                match owner {
                    None => {
                        return Err(DbError::NotFound(format!(
                            "Chunk not found: {}",
                            extraction.chunk_id
                        )))
                    }
                    Some(owner) if owner != extraction.source_id => {
                        return Err(DbError::Integrity(format!(
                            "extraction {} names source {} but chunk {} belongs to {}",
                            extraction.id, extraction.source_id, extraction.chunk_id, owner
                        )))
                    }
                    Some(_) => {}
                }

                insert_stmt.execute(params![
                    extraction.id,
                    extraction.source_id,
                    extraction.chunk_id,
                    extraction.extraction_type().as_str(),
                    extraction.title,
                    serde_json::to_string(&extraction.topics)?,
                    extraction.confidence as f64,
                    serde_json::to_string(&extraction.content)?,
                    extraction.search_text(),
                    extraction.created_at.to_rfc3339(),
                ])?;

                for topic in &extraction.topics {
                    topic_stmt.execute(params![extraction.id, topic])?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Get an extraction by ID.
    pub fn get_extraction(&self, id: &str) -> DbResult<Extraction> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM extractions e WHERE e.id = ?1", EXTRACTION_COLUMNS),
            params![id],
            row_to_extraction,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DbError::NotFound(format!("Extraction not found: {}", id))
            }
            _ => DbError::from(e),
        })
    }

    /// Get an extraction by full ID or unique ID prefix.
    pub fn get_extraction_by_prefix(&self, prefix: &str) -> DbResult<Extraction> {
        let id = {
            let conn = self.conn()?;
            resolve_id(&conn, "extractions", prefix)?
        };
        self.get_extraction(&id)
    }

    /// List extractions matching a filter, newest first.
    pub fn list_extractions(&self, filter: &ExtractionFilter) -> DbResult<Vec<Extraction>> {
        let conn = self.conn()?;
        let mut values = Vec::new();
        let conditions = filter.sql_conditions(&mut values);
        values.push(Value::Integer(filter.limit.unwrap_or(100) as i64));

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM extractions e WHERE 1 = 1{} ORDER BY e.created_at DESC, e.id LIMIT ?",
            EXTRACTION_COLUMNS, conditions
        ))?;

        let extractions = stmt.query_map(params_from_iter(values.iter()), row_to_extraction)?;
        extractions.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Delete all extractions for a source.
    pub fn delete_extractions_by_source(&self, source_id: &str) -> DbResult<usize> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM extractions WHERE source_id = ?1",
            params![source_id],
        )?;
        Ok(rows)
    }

    /// Full-text search over extraction titles and fields.
    ///
    /// `query` must already be a valid FTS5 expression (see [`crate::fts_query`]).
    pub fn search_extractions_fts(
        &self,
        query: &str,
        filter: &ExtractionFilter,
    ) -> DbResult<Vec<ExtractionMatch>> {
        let conn = self.conn()?;
        let mut values = vec![Value::Text(query.to_string())];
        let conditions = filter.sql_conditions(&mut values);
        values.push(Value::Integer(filter.limit.unwrap_or(100) as i64));

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}, bm25(extractions_fts)
            FROM extractions_fts
            JOIN extractions e ON e.rowid = extractions_fts.rowid
            WHERE extractions_fts MATCH ?{}
            ORDER BY bm25(extractions_fts), e.id
            LIMIT ?
            "#,
            EXTRACTION_COLUMNS, conditions
        ))?;

        let matches = stmt.query_map(params_from_iter(values.iter()), |row| {
            let extraction = row_to_extraction(row)?;
            let rank: f64 = row.get(8)?;
            Ok(ExtractionMatch {
                extraction,
                score: bm25_score(rank),
            })
        })?;

        matches.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fts_query;
    use lore_core::{Chunk, ExtractionContent, ExtractionDraft, Severity, Source, SourceType};

    fn warning(pitfall: &str, topics: &[&str]) -> ExtractionDraft {
        ExtractionDraft {
            title: pitfall.to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            confidence: 0.8,
            content: ExtractionContent::Warning {
                pitfall: pitfall.to_string(),
                symptoms: vec!["Latency spikes".to_string()],
                mitigation: "Add timeouts".to_string(),
                severity: Severity::High,
            },
        }
    }

    fn checklist(purpose: &str) -> ExtractionDraft {
        ExtractionDraft {
            title: purpose.to_string(),
            topics: vec!["release".to_string()],
            confidence: 0.6,
            content: ExtractionContent::Checklist {
                purpose: purpose.to_string(),
                items: vec!["Tag the build".to_string()],
            },
        }
    }

    fn setup() -> (Database, Source, Chunk) {
        let db = Database::open_in_memory().unwrap();
        let source = Source::new(SourceType::Book, "Release It");
        db.create_source(&source).unwrap();
        let chunk = Chunk::new(source.id.clone(), 0, "Integration points are the number one killer");
        db.create_chunks(std::slice::from_ref(&chunk)).unwrap();
        (db, source, chunk)
    }

    #[test]
    fn test_create_and_get_extraction() {
        let (db, source, chunk) = setup();
        let extraction = Extraction::from_draft(warning("Unbounded waits", &["Timeouts"]), &chunk);
        db.create_extractions(std::slice::from_ref(&extraction)).unwrap();

        let fetched = db.get_extraction(&extraction.id).unwrap();
        assert_eq!(fetched.source_id, source.id);
        assert_eq!(fetched.chunk_id, chunk.id);
        assert_eq!(fetched.topics, vec!["timeouts"]);
        assert_eq!(fetched.content, extraction.content);
        assert!((fetched.confidence - 0.8).abs() < 1e-6);

        let by_prefix = db.get_extraction_by_prefix(&extraction.id[..8]).unwrap();
        assert_eq!(by_prefix.id, extraction.id);
    }

    #[test]
    fn test_mismatched_source_rejected() {
        let (db, _source, chunk) = setup();
        let other = Source::new(SourceType::Notes, "Other");
        db.create_source(&other).unwrap();

        let mut extraction = Extraction::from_draft(warning("x", &[]), &chunk);
        extraction.source_id = other.id.clone();

        let good = Extraction::from_draft(checklist("y"), &chunk);
        let result = db.create_extractions(&[good.clone(), extraction]);
        assert!(matches!(result, Err(DbError::Integrity(_))));

        // Whole batch rolled back.
        assert!(matches!(db.get_extraction(&good.id), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_list_extractions_filters() {
        let (db, source, chunk) = setup();
        let w = Extraction::from_draft(warning("Blocked threads", &["threads", "timeouts"]), &chunk);
        let c = Extraction::from_draft(checklist("Pre-release review"), &chunk);
        db.create_extractions(&[w.clone(), c.clone()]).unwrap();

        let warnings = db
            .list_extractions(&ExtractionFilter::new().with_type(ExtractionType::Warning))
            .unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].id, w.id);

        let tagged = db
            .list_extractions(&ExtractionFilter::new().with_topic("release"))
            .unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].id, c.id);

        let both = db
            .list_extractions(
                &ExtractionFilter::new()
                    .with_type(ExtractionType::Warning)
                    .with_type(ExtractionType::Checklist)
                    .with_source(source.id.clone()),
            )
            .unwrap();
        assert_eq!(both.len(), 2);

        let limited = db.list_extractions(&ExtractionFilter::new().with_limit(1)).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_search_extractions_fts() {
        let (db, _source, chunk) = setup();
        let w = Extraction::from_draft(warning("Blocked threads", &["threads"]), &chunk);
        let c = Extraction::from_draft(checklist("Pre-release review"), &chunk);
        db.create_extractions(&[w.clone(), c]).unwrap();

        let query = fts_query("timeouts?").unwrap();
        let hits = db.search_extractions_fts(&query, &ExtractionFilter::new()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].extraction.id, w.id);

        let filtered = db
            .search_extractions_fts(&query, &ExtractionFilter::new().with_type(ExtractionType::Checklist))
            .unwrap();
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_deleting_chunks_cascades_to_extractions() {
        let (db, source, chunk) = setup();
        let w = Extraction::from_draft(warning("Blocked threads", &["threads"]), &chunk);
        db.create_extractions(std::slice::from_ref(&w)).unwrap();

        db.delete_chunks_by_source(&source.id).unwrap();
        assert!(db.list_extractions(&ExtractionFilter::new()).unwrap().is_empty());
        assert!(db.list_extractions(&ExtractionFilter::new().with_topic("threads")).unwrap().is_empty());
    }
}
