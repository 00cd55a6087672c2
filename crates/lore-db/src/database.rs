//! Connection pool over the SQLite store.

use crate::error::{DbError, DbResult};
use crate::migrations;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use tracing::info;

pub type ConnectionPool = Pool<SqliteConnectionManager>;
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Connections kept for a file-backed store.
const FILE_POOL_SIZE: u32 = 8;

/// Handle to the document and vector store. Cloning shares the pool.
#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DbError::Other(format!("cannot create {}: {}", parent.display(), e)))?;
        }

        info!("Opening store at {}", path.display());

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )
        });

        Self::migrated(Pool::builder().max_size(FILE_POOL_SIZE).build(manager)?)
    }

    /// In-memory store for tests. One connection, since each in-memory
    /// connection would otherwise see its own empty database.
    pub fn open_in_memory() -> DbResult<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

        Self::migrated(Pool::builder().max_size(1).build(manager)?)
    }

    fn migrated(pool: ConnectionPool) -> DbResult<Self> {
        {
            let conn = pool.get()?;
            migrations::initialize_schema(&conn)?;
        }
        Ok(Self { pool })
    }

    pub fn conn(&self) -> DbResult<PooledConn> {
        self.pool.get().map_err(DbError::from)
    }

    /// Schema version recorded in the store.
    pub fn schema_version(&self) -> DbResult<i32> {
        let conn = self.conn()?;
        migrations::get_schema_version(&conn)
    }
}
