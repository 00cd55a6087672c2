//! Store statistics operations.

use crate::database::Database;
use crate::error::DbResult;
use lore_core::StoreStats;
use rusqlite::Connection;
use std::collections::HashMap;

fn grouped_counts(conn: &Connection, sql: &str) -> DbResult<HashMap<String, i64>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

    let mut counts = HashMap::new();
    for row in rows {
        let (key, count) = row?;
        counts.insert(key, count);
    }
    Ok(counts)
}

impl Database {
    /// Get statistics about the document and vector stores.
    pub fn get_stats(&self) -> DbResult<StoreStats> {
        let conn = self.conn()?;
        let count = |sql: &str| -> DbResult<i64> { Ok(conn.query_row(sql, [], |row| row.get(0))?) };

        let total_sources = count("SELECT COUNT(*) FROM sources")?;
        let sources_by_status =
            grouped_counts(&conn, "SELECT status, COUNT(*) FROM sources GROUP BY status")?;
        let total_chunks = count("SELECT COUNT(*) FROM chunks")?;
        let total_extractions = count("SELECT COUNT(*) FROM extractions")?;
        let extractions_by_type = grouped_counts(
            &conn,
            "SELECT extraction_type, COUNT(*) FROM extractions GROUP BY extraction_type",
        )?;
        let embedded_chunks = count("SELECT COUNT(*) FROM vectors WHERE owner_kind = 'chunk'")?;
        let embedded_extractions =
            count("SELECT COUNT(*) FROM vectors WHERE owner_kind = 'extraction'")?;
        let total_topics = count("SELECT COUNT(DISTINCT topic) FROM extraction_topics")?;

        // Database size (page_count * page_size)
        let page_count: i64 = conn.pragma_query_value(None, "page_count", |row| row.get(0))?;
        let page_size: i64 = conn.pragma_query_value(None, "page_size", |row| row.get(0))?;

        Ok(StoreStats {
            total_sources,
            sources_by_status,
            total_chunks,
            total_extractions,
            extractions_by_type,
            embedded_chunks,
            embedded_extractions,
            total_topics,
            database_size_bytes: page_count * page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OwnerKind;
    use lore_core::{Chunk, Extraction, ExtractionContent, ExtractionDraft, Source, SourceType};

    #[test]
    fn test_get_stats() {
        let db = Database::open_in_memory().unwrap();

        let mut done = Source::new(SourceType::Book, "Done");
        done.start_processing().unwrap();
        done.mark_complete().unwrap();
        let pending = Source::new(SourceType::Paper, "Pending");
        db.create_source(&done).unwrap();
        db.create_source(&pending).unwrap();

        let chunk = Chunk::new(done.id.clone(), 0, "Use a checklist before every release");
        db.create_chunks(std::slice::from_ref(&chunk)).unwrap();
        let extraction = Extraction::from_draft(
            ExtractionDraft {
                title: "Release checklist".to_string(),
                topics: vec!["release".to_string(), "quality".to_string()],
                confidence: 0.7,
                content: ExtractionContent::Checklist {
                    purpose: "Release".to_string(),
                    items: vec!["Run tests".to_string()],
                },
            },
            &chunk,
        );
        db.create_extractions(std::slice::from_ref(&extraction)).unwrap();
        db.store_vector(OwnerKind::Chunk, &chunk.id, &[1.0, 0.0], "m").unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.total_sources, 2);
        assert_eq!(stats.sources_by_status.get("complete"), Some(&1));
        assert_eq!(stats.sources_by_status.get("pending"), Some(&1));
        assert_eq!(stats.total_chunks, 1);
        assert_eq!(stats.total_extractions, 1);
        assert_eq!(stats.extractions_by_type.get("checklist"), Some(&1));
        assert_eq!(stats.embedded_chunks, 1);
        assert_eq!(stats.embedded_extractions, 0);
        assert_eq!(stats.total_topics, 2);
        assert!(stats.database_size_bytes > 0);
    }
}
