//! Lore Ollama - Ollama integration for extraction and embeddings.
//!
//! The client is only used at ingestion time: `generate` drives the
//! knowledge extractor in JSON mode and `embed` produces the vectors stored
//! for chunks, extractions and search queries.

mod client;
mod error;
mod types;

pub use client::OllamaClient;
pub use error::{OllamaError, OllamaResult};
pub use types::*;
