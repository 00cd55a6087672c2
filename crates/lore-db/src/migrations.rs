//! Database migrations and schema management.

use crate::error::DbResult;
use rusqlite::Connection;
use tracing::info;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> DbResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating initial database schema...");
        create_initial_schema(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating database from version {} to {}",
            current_version, SCHEMA_VERSION
        );
        set_schema_version(conn, SCHEMA_VERSION)?;
    }

    Ok(())
}

pub(crate) fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> DbResult<()> {
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}

fn create_initial_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- Books, papers and documents
        CREATE TABLE IF NOT EXISTS sources (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            authors TEXT NOT NULL DEFAULT '[]',
            source_type TEXT NOT NULL,
            path TEXT,
            content_hash TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            error TEXT,
            created_at TEXT NOT NULL,
            ingested_at TEXT,
            metadata TEXT DEFAULT '{}'
        );

        CREATE INDEX IF NOT EXISTS idx_sources_status ON sources(status);
        CREATE INDEX IF NOT EXISTS idx_sources_path ON sources(path);
        CREATE INDEX IF NOT EXISTS idx_sources_hash ON sources(content_hash);

        -- Vector store for chunks and extractions
        CREATE TABLE IF NOT EXISTS vectors (
            owner_kind TEXT NOT NULL,
            owner_id TEXT NOT NULL,
            vector BLOB NOT NULL,
            model TEXT NOT NULL,
            dimensions INTEGER NOT NULL,
            PRIMARY KEY (owner_kind, owner_id)
        );

        -- Positioned spans of source text
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            source_id TEXT NOT NULL REFERENCES sources(id) ON DELETE CASCADE,
            chunk_index INTEGER NOT NULL,
            content TEXT NOT NULL,
            chapter TEXT,
            section TEXT,
            page INTEGER,
            UNIQUE (source_id, chunk_index)
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source_id);

        CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
            content,
            content='chunks',
            content_rowid='rowid'
        );

        CREATE TRIGGER IF NOT EXISTS chunks_ai AFTER INSERT ON chunks BEGIN
            INSERT INTO chunks_fts(rowid, content) VALUES (NEW.rowid, NEW.content);
        END;

        CREATE TRIGGER IF NOT EXISTS chunks_ad AFTER DELETE ON chunks BEGIN
            INSERT INTO chunks_fts(chunks_fts, rowid, content) VALUES('delete', OLD.rowid, OLD.content);
            DELETE FROM vectors WHERE owner_kind = 'chunk' AND owner_id = OLD.id;
        END;

        CREATE TRIGGER IF NOT EXISTS chunks_au AFTER UPDATE ON chunks BEGIN
            INSERT INTO chunks_fts(chunks_fts, rowid, content) VALUES('delete', OLD.rowid, OLD.content);
            INSERT INTO chunks_fts(rowid, content) VALUES (NEW.rowid, NEW.content);
        END;

        -- Typed knowledge records
        CREATE TABLE IF NOT EXISTS extractions (
            id TEXT PRIMARY KEY,
            source_id TEXT NOT NULL REFERENCES sources(id) ON DELETE CASCADE,
            chunk_id TEXT NOT NULL REFERENCES chunks(id) ON DELETE CASCADE,
            extraction_type TEXT NOT NULL,
            title TEXT NOT NULL,
            topics TEXT NOT NULL DEFAULT '[]',
            confidence REAL NOT NULL DEFAULT 0.5,
            content TEXT NOT NULL,
            search_text TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_extractions_type ON extractions(extraction_type);
        CREATE INDEX IF NOT EXISTS idx_extractions_source ON extractions(source_id);
        CREATE INDEX IF NOT EXISTS idx_extractions_chunk ON extractions(chunk_id);

        CREATE VIRTUAL TABLE IF NOT EXISTS extractions_fts USING fts5(
            title,
            search_text,
            content='extractions',
            content_rowid='rowid'
        );

        CREATE TRIGGER IF NOT EXISTS extractions_ai AFTER INSERT ON extractions BEGIN
            INSERT INTO extractions_fts(rowid, title, search_text)
            VALUES (NEW.rowid, NEW.title, NEW.search_text);
        END;

        CREATE TRIGGER IF NOT EXISTS extractions_ad AFTER DELETE ON extractions BEGIN
            INSERT INTO extractions_fts(extractions_fts, rowid, title, search_text)
            VALUES('delete', OLD.rowid, OLD.title, OLD.search_text);
            DELETE FROM vectors WHERE owner_kind = 'extraction' AND owner_id = OLD.id;
        END;

        CREATE TRIGGER IF NOT EXISTS extractions_au AFTER UPDATE ON extractions BEGIN
            INSERT INTO extractions_fts(extractions_fts, rowid, title, search_text)
            VALUES('delete', OLD.rowid, OLD.title, OLD.search_text);
            INSERT INTO extractions_fts(rowid, title, search_text)
            VALUES (NEW.rowid, NEW.title, NEW.search_text);
        END;

        -- Topic tags, one row per (extraction, topic)
        CREATE TABLE IF NOT EXISTS extraction_topics (
            extraction_id TEXT NOT NULL REFERENCES extractions(id) ON DELETE CASCADE,
            topic TEXT NOT NULL,
            PRIMARY KEY (extraction_id, topic)
        );

        CREATE INDEX IF NOT EXISTS idx_extraction_topics_topic ON extraction_topics(topic);

        PRAGMA foreign_keys = ON;
        "#,
    )?;

    Ok(())
}
