//! LLM-based knowledge extraction.

use crate::error::IngestResult;
use crate::prompt::{build_extraction_prompt, build_retry_prompt, parse_extraction_response, SYSTEM_PROMPT};
use lore_config::Config;
use lore_core::{Chunk, ExtractionDraft, Source};
use lore_ollama::{GenerateOptions, GenerateRequest, OllamaClient};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

/// Token cap for one extraction answer.
const MAX_ANSWER_TOKENS: i32 = 2048;

/// Turns a chunk into typed knowledge records.
pub trait KnowledgeExtractor: Send + Sync {
    /// Extract drafts from one chunk of `source`.
    ///
    /// An empty result is a normal outcome. `Err` is reserved for failures
    /// talking to the model, not for answers that could not be parsed.
    fn extract(&self, source: &Source, chunk: &Chunk) -> IngestResult<Vec<ExtractionDraft>>;
}

/// Tuning for the Ollama extractor.
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub model: String,
    pub temperature: f32,
    /// Chunks shorter than this (in characters) are not sent to the model.
    pub min_chars: usize,
    pub max_per_chunk: usize,
    /// Extra attempts after an unusable answer.
    pub retries: usize,
}

impl ExtractionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.ollama.model.clone(),
            temperature: config.ingestion.extraction_temperature,
            min_chars: config.ingestion.min_extract_chars,
            max_per_chunk: config.ingestion.max_extractions_per_chunk,
            retries: config.ingestion.extraction_retries,
        }
    }
}

/// One blocking round trip to a text model.
pub trait Llm: Send + Sync {
    /// Send `prompt` and return the raw answer.
    fn generate(&self, prompt: String) -> IngestResult<String>;
}

/// A local Ollama model in JSON mode, driven from sync code.
pub struct OllamaLlm {
    client: OllamaClient,
    model: String,
    temperature: f32,
    rt: Runtime,
}

impl OllamaLlm {
    pub fn new(client: OllamaClient, model: impl Into<String>, temperature: f32) -> IngestResult<Self> {
        Ok(Self {
            client,
            model: model.into(),
            temperature,
            rt: Runtime::new()?,
        })
    }
}

impl Llm for OllamaLlm {
    fn generate(&self, prompt: String) -> IngestResult<String> {
        let request = GenerateRequest::new(&self.model, prompt)
            .with_system(SYSTEM_PROMPT)
            .with_json_format()
            .with_options(
                GenerateOptions::new()
                    .with_temperature(self.temperature)
                    .with_num_predict(MAX_ANSWER_TOKENS),
            );

        let response = self.rt.block_on(self.client.generate(request))?;
        if !response.done || response.done_reason.as_deref() == Some("length") {
            debug!("Answer from {} hit the token cap", response.model);
        }
        Ok(response.response)
    }
}

/// Extractor that prompts a model and retries unusable answers.
pub struct LlmExtractor {
    llm: Box<dyn Llm>,
    settings: ExtractionSettings,
}

impl LlmExtractor {
    pub fn new(llm: Box<dyn Llm>, settings: ExtractionSettings) -> Self {
        Self { llm, settings }
    }

    /// Create an extractor from config, failing unless Ollama serves the model.
    pub fn from_config(config: &Config) -> IngestResult<Self> {
        let client = OllamaClient::from_config(&config.ollama)?;
        let settings = ExtractionSettings::from_config(config);
        let llm = OllamaLlm::new(client, settings.model.clone(), settings.temperature)?;
        llm.rt.block_on(llm.client.ensure_model(&settings.model))?;

        Ok(Self::new(Box::new(llm), settings))
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }
}

impl KnowledgeExtractor for LlmExtractor {
    fn extract(&self, source: &Source, chunk: &Chunk) -> IngestResult<Vec<ExtractionDraft>> {
        if chunk.content.chars().count() < self.settings.min_chars {
            debug!("Chunk {} too short for extraction", chunk.chunk_index);
            return Ok(Vec::new());
        }

        let mut prompt = build_extraction_prompt(
            &source.title,
            &chunk.position,
            &chunk.content,
            self.settings.max_per_chunk,
        );

        for attempt in 0..=self.settings.retries {
            let answer = self.llm.generate(prompt)?;

            match parse_extraction_response(&answer, self.settings.max_per_chunk) {
                Ok(drafts) => {
                    debug!(
                        "Chunk {} yielded {} extractions (attempt {})",
                        chunk.chunk_index,
                        drafts.len(),
                        attempt + 1
                    );
                    return Ok(drafts);
                }
                Err(problem) => {
                    debug!("Unusable extraction answer on attempt {}: {}", attempt + 1, problem);
                    prompt = build_retry_prompt(&answer, &problem);
                }
            }
        }

        warn!(
            "Giving up on chunk {} of '{}' after {} attempts",
            chunk.chunk_index,
            source.title,
            self.settings.retries + 1
        );
        Ok(Vec::new())
    }
}
