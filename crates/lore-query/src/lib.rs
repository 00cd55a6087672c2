//! Lore Query - Read-only retrieval over the knowledge store.
//!
//! Combines full-text and vector similarity into one ranked result list,
//! and exposes the typed lookups the MCP server and CLI are built on.
//! Nothing here calls a language model; query vectors are supplied by the caller.

mod error;
mod service;
mod types;

pub use error::{QueryError, QueryResult};
pub use service::{QueryService, MAX_LIMIT};
pub use types::*;
