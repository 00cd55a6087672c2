//! Query error types.

use lore_db::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Store error: {0}")]
    Store(DbError),
}

impl From<DbError> for QueryError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => QueryError::NotFound(what),
            DbError::Ambiguous(prefix) => {
                QueryError::InvalidRequest(format!("ID prefix '{}' matches more than one record", prefix))
            }
            other => QueryError::Store(other),
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
