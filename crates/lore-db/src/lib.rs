//! Lore DB - Document and vector store for Lore using SQLite.
//!
//! Structured records (sources, chunks, extractions, topics) live in plain
//! tables with FTS5 indexes; embeddings for chunks and extractions live in
//! the `vectors` table and are searched by brute-force cosine similarity.

mod database;
mod error;
mod fts;
mod migrations;
mod operations;

pub use database::Database;
pub use error::{DbError, DbResult};
pub use fts::fts_query;
pub use operations::extractions::ExtractionFilter;
pub use operations::vectors::{cosine_similarity, ChunkMatch, ExtractionMatch, OwnerKind};
