//! Database CRUD operations.

pub mod chunks;
pub mod extractions;
pub mod sources;
pub mod stats;
pub mod topics;
pub mod vectors;

use crate::error::{DbError, DbResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

pub(crate) fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Resolve a full id or a unique id prefix against `table`.
pub(crate) fn resolve_id(conn: &Connection, table: &str, prefix: &str) -> DbResult<String> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err(DbError::NotFound(format!("empty {} id", table)));
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM {} WHERE id = ?1 OR substr(id, 1, length(?1)) = ?1 ORDER BY id = ?1 DESC LIMIT 2",
        table
    ))?;
    let ids = stmt
        .query_map(params![prefix], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    match ids.as_slice() {
        [] => Err(DbError::NotFound(format!("No {} matches: {}", table, prefix))),
        [only] => Ok(only.clone()),
        [first, ..] if first == prefix => Ok(first.clone()),
        _ => Err(DbError::Ambiguous(prefix.to_string())),
    }
}
