//! Lore Ingest - Ingestion pipeline for books, papers and documents.
//!
//! This crate provides:
//! - Document parsing (Markdown, PDF, plain text) into positioned sections
//! - Section-aware chunking
//! - LLM-based knowledge extraction into typed records
//! - Embedding of chunks and extractions
//! - The `Ingestor` that drives a source through its lifecycle

mod chunker;
mod embedder;
mod error;
mod extractor;
mod ingestor;
pub mod parsers;
mod prompt;

pub use chunker::{ChunkConfig, Chunker};
pub use embedder::{Embedder, OllamaEmbedder};
pub use error::{IngestError, IngestResult};
pub use extractor::{ExtractionSettings, KnowledgeExtractor, Llm, LlmExtractor, OllamaLlm};
pub use ingestor::{collect_files, EmbedReport, IngestReport, Ingestor, ProcessOutcome, SourceOptions};
pub use prompt::parse_extraction_response;
