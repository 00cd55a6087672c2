//! Source CRUD operations.

use super::{parse_timestamp, resolve_id};
use crate::database::Database;
use crate::error::{DbError, DbResult};
use lore_core::{IngestionStatus, Source, SourceType};
use rusqlite::{params, Row};

const SOURCE_COLUMNS: &str =
    "id, title, authors, source_type, path, content_hash, status, error, created_at, ingested_at, metadata";

fn row_to_source(row: &Row) -> rusqlite::Result<Source> {
    let authors_str: String = row.get(2)?;
    let source_type_str: String = row.get(3)?;
    let status_str: String = row.get(6)?;
    let created_at_str: String = row.get(8)?;
    let ingested_at_str: Option<String> = row.get(9)?;
    let metadata_str: Option<String> = row.get(10)?;

    Ok(Source {
        id: row.get(0)?,
        title: row.get(1)?,
        authors: serde_json::from_str(&authors_str).unwrap_or_default(),
        source_type: SourceType::from_str(&source_type_str).unwrap_or(SourceType::Other),
        path: row.get(4)?,
        content_hash: row.get(5)?,
        status: IngestionStatus::from_str(&status_str).unwrap_or_default(),
        error: row.get(7)?,
        created_at: parse_timestamp(&created_at_str),
        ingested_at: ingested_at_str.as_deref().map(parse_timestamp),
        metadata: metadata_str
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_else(|| serde_json::json!({})),
    })
}

impl Database {
    /// Create a new source.
    pub fn create_source(&self, source: &Source) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO sources ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                SOURCE_COLUMNS
            ),
            params![
                source.id,
                source.title,
                serde_json::to_string(&source.authors)?,
                source.source_type.as_str(),
                source.path,
                source.content_hash,
                source.status.as_str(),
                source.error,
                source.created_at.to_rfc3339(),
                source.ingested_at.map(|dt| dt.to_rfc3339()),
                source.metadata.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Get a source by ID.
    pub fn get_source(&self, id: &str) -> DbResult<Source> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM sources WHERE id = ?1", SOURCE_COLUMNS),
            params![id],
            row_to_source,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DbError::NotFound(format!("Source not found: {}", id))
            }
            _ => DbError::from(e),
        })
    }

    /// Get a source by full ID or unique ID prefix.
    pub fn get_source_by_prefix(&self, prefix: &str) -> DbResult<Source> {
        let id = {
            let conn = self.conn()?;
            resolve_id(&conn, "sources", prefix)?
        };
        self.get_source(&id)
    }

    /// Update a source.
    pub fn update_source(&self, source: &Source) -> DbResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            r#"
            UPDATE sources
            SET title = ?2, authors = ?3, source_type = ?4, path = ?5, content_hash = ?6,
                status = ?7, error = ?8, ingested_at = ?9, metadata = ?10
            WHERE id = ?1
            "#,
            params![
                source.id,
                source.title,
                serde_json::to_string(&source.authors)?,
                source.source_type.as_str(),
                source.path,
                source.content_hash,
                source.status.as_str(),
                source.error,
                source.ingested_at.map(|dt| dt.to_rfc3339()),
                source.metadata.to_string(),
            ],
        )?;

        if rows == 0 {
            return Err(DbError::NotFound(format!("Source not found: {}", source.id)));
        }

        Ok(())
    }

    /// Delete a source and, by cascade, its chunks, extractions and vectors.
    pub fn delete_source(&self, id: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM sources WHERE id = ?1", params![id])?;

        if rows == 0 {
            return Err(DbError::NotFound(format!("Source not found: {}", id)));
        }

        Ok(())
    }

    /// List sources in title order, optionally filtered by status and type.
    pub fn list_sources(
        &self,
        status: Option<IngestionStatus>,
        source_type: Option<SourceType>,
    ) -> DbResult<Vec<Source>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sources
             WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR source_type = ?2)
             ORDER BY title COLLATE NOCASE, id",
            SOURCE_COLUMNS
        ))?;

        let sources = stmt.query_map(
            params![status.map(|s| s.as_str()), source_type.map(|t| t.as_str())],
            row_to_source,
        )?;
        sources.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Sources waiting to be processed, oldest first.
    pub fn pending_sources(&self) -> DbResult<Vec<Source>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sources WHERE status = 'pending' ORDER BY created_at, id",
            SOURCE_COLUMNS
        ))?;
        let sources = stmt.query_map([], row_to_source)?;
        sources.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Find a source by file path.
    pub fn find_source_by_path(&self, path: &str) -> DbResult<Option<Source>> {
        let conn = self.conn()?;
        let result = conn.query_row(
            &format!("SELECT {} FROM sources WHERE path = ?1", SOURCE_COLUMNS),
            params![path],
            row_to_source,
        );

        match result {
            Ok(source) => Ok(Some(source)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DbError::from(e)),
        }
    }

    /// Find a source by content hash, preferring completed ones.
    pub fn find_source_by_hash(&self, hash: &str) -> DbResult<Option<Source>> {
        let conn = self.conn()?;
        let result = conn.query_row(
            &format!(
                "SELECT {} FROM sources WHERE content_hash = ?1
                 ORDER BY status = 'complete' DESC, created_at LIMIT 1",
                SOURCE_COLUMNS
            ),
            params![hash],
            row_to_source,
        );

        match result {
            Ok(source) => Ok(Some(source)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DbError::from(e)),
        }
    }

    /// Number of chunks and extractions belonging to a source.
    pub fn source_counts(&self, id: &str) -> DbResult<(i64, i64)> {
        let conn = self.conn()?;
        let counts = conn.query_row(
            r#"
            SELECT
                (SELECT COUNT(*) FROM chunks WHERE source_id = ?1),
                (SELECT COUNT(*) FROM extractions WHERE source_id = ?1)
            "#,
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(counts)
    }
}
