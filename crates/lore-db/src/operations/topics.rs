//! Topic tag queries.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use rusqlite::params;

impl Database {
    /// All topics with the number of extractions tagged with each, most used first.
    pub fn topic_counts(&self, limit: Option<usize>) -> DbResult<Vec<(String, i64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT topic, COUNT(*) AS n
            FROM extraction_topics
            GROUP BY topic
            ORDER BY n DESC, topic
            LIMIT ?1
            "#,
        )?;

        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let rows = stmt.query_map(params![limit], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Distinct topics used by a source's extractions, alphabetically.
    pub fn topics_for_source(&self, source_id: &str) -> DbResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT t.topic
            FROM extraction_topics t
            JOIN extractions e ON e.id = t.extraction_id
            WHERE e.source_id = ?1
            ORDER BY t.topic
            "#,
        )?;

        let rows = stmt.query_map(params![source_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}
