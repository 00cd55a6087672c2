//! Chunk CRUD operations.

use super::vectors::ChunkMatch;
use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::fts::bm25_score;
use lore_core::{Chunk, ChunkPosition};
use rusqlite::{params, Row};

pub(crate) const CHUNK_COLUMNS: &str =
    "c.id, c.source_id, c.chunk_index, c.content, c.chapter, c.section, c.page";

pub(crate) fn row_to_chunk(row: &Row) -> rusqlite::Result<Chunk> {
    Ok(Chunk {
        id: row.get(0)?,
        source_id: row.get(1)?,
        chunk_index: row.get(2)?,
        content: row.get(3)?,
        position: ChunkPosition {
            chapter: row.get(4)?,
            section: row.get(5)?,
            page: row.get(6)?,
        },
    })
}

impl Database {
    /// Create multiple chunks in a transaction.
    pub fn create_chunks(&self, chunks: &[Chunk]) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO chunks (id, source_id, chunk_index, content, chapter, section, page)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;

            for chunk in chunks {
                stmt.execute(params![
                    chunk.id,
                    chunk.source_id,
                    chunk.chunk_index,
                    chunk.content,
                    chunk.position.chapter,
                    chunk.position.section,
                    chunk.position.page,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Get a chunk by ID.
    pub fn get_chunk(&self, id: &str) -> DbResult<Chunk> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM chunks c WHERE c.id = ?1", CHUNK_COLUMNS),
            params![id],
            row_to_chunk,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DbError::NotFound(format!("Chunk not found: {}", id))
            }
            _ => DbError::from(e),
        })
    }

    /// Get all chunks for a source, in document order.
    pub fn get_chunks_by_source(&self, source_id: &str) -> DbResult<Vec<Chunk>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM chunks c WHERE c.source_id = ?1 ORDER BY c.chunk_index",
            CHUNK_COLUMNS
        ))?;

        let chunks = stmt.query_map(params![source_id], row_to_chunk)?;
        chunks.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Delete all chunks for a source. Extractions and vectors go with them.
    pub fn delete_chunks_by_source(&self, source_id: &str) -> DbResult<usize> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM chunks WHERE source_id = ?1", params![source_id])?;
        Ok(rows)
    }

    /// Full-text search over chunk content.
    ///
    /// `query` must already be a valid FTS5 expression (see [`crate::fts_query`]).
    pub fn search_chunks_fts(
        &self,
        query: &str,
        source_id: Option<&str>,
        limit: usize,
    ) -> DbResult<Vec<ChunkMatch>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}, bm25(chunks_fts)
            FROM chunks_fts
            JOIN chunks c ON c.rowid = chunks_fts.rowid
            WHERE chunks_fts MATCH ?1 AND (?2 IS NULL OR c.source_id = ?2)
            ORDER BY bm25(chunks_fts), c.id
            LIMIT ?3
            "#,
            CHUNK_COLUMNS
        ))?;

        let matches = stmt.query_map(params![query, source_id, limit as i64], |row| {
            let chunk = row_to_chunk(row)?;
            let rank: f64 = row.get(7)?;
            Ok(ChunkMatch {
                chunk,
                score: bm25_score(rank),
            })
        })?;

        matches.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}
