//! Text embedding for chunks, extractions and queries.

use crate::error::IngestResult;
use lore_config::Config;
use lore_ollama::OllamaClient;
use tokio::runtime::Runtime;

/// Produces a vector for a piece of text.
pub trait Embedder: Send + Sync {
    /// Name of the embedding model, stored next to each vector.
    fn model(&self) -> &str;

    fn embed(&self, text: &str) -> IngestResult<Vec<f32>>;
}

/// Embedder backed by Ollama's embeddings endpoint.
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    rt: Runtime,
}

impl OllamaEmbedder {
    /// Create an embedder from config, failing unless Ollama serves the model.
    pub fn from_config(config: &Config) -> IngestResult<Self> {
        let client = OllamaClient::from_config(&config.ollama)?;
        let rt = Runtime::new()?;
        rt.block_on(client.ensure_model(&config.ollama.embedding_model))?;

        Ok(Self {
            client,
            model: config.ollama.embedding_model.clone(),
            rt,
        })
    }

    pub fn new(client: OllamaClient, model: impl Into<String>) -> IngestResult<Self> {
        Ok(Self {
            client,
            model: model.into(),
            rt: Runtime::new()?,
        })
    }
}

impl Embedder for OllamaEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn embed(&self, text: &str) -> IngestResult<Vec<f32>> {
        Ok(self.rt.block_on(self.client.embed(&self.model, text))?)
    }
}
