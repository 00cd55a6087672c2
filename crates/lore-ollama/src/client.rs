//! Ollama HTTP client.

use crate::error::{OllamaError, OllamaResult};
use crate::types::*;
use lore_config::OllamaConfig;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Client for interacting with Ollama's API.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    host: String,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a new client from configuration.
    pub fn from_config(config: &OllamaConfig) -> OllamaResult<Self> {
        Self::with_timeout(&config.host, Duration::from_secs(config.timeout_seconds))
    }

    /// Create a new client with default settings.
    pub fn new(host: impl Into<String>) -> OllamaResult<Self> {
        Self::with_timeout(&host.into(), Duration::from_secs(120))
    }

    fn with_timeout(host: &str, timeout: Duration) -> OllamaResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OllamaError::Http)?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn send_error(&self, e: reqwest::Error) -> OllamaError {
        if e.is_connect() {
            OllamaError::ServerNotRunning {
                host: self.host.clone(),
            }
        } else if e.is_timeout() {
            OllamaError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            OllamaError::Http(e)
        }
    }

    /// Turn a non-success response into an error, naming the model on 404s.
    async fn check_status(response: Response, model: &str) -> OllamaResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        if status.as_u16() == 404 || text.contains("not found") {
            return Err(OllamaError::ModelNotFound {
                model: model.to_string(),
            });
        }

        Err(OllamaError::ApiError {
            status: status.as_u16(),
            message: text,
        })
    }

    /// Names of the models pulled into the server.
    pub async fn installed_models(&self) -> OllamaResult<Vec<String>> {
        let url = format!("{}/api/tags", self.host);
        debug!("Listing models from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let response = Self::check_status(response, "").await?;

        let list: ListModelsResponse = response.json().await?;
        Ok(list.models.into_iter().map(|m| m.name).collect())
    }

    /// Fail unless the server is reachable and has `model`.
    ///
    /// A bare name matches any tag of it (`llama3.1` matches `llama3.1:8b`).
    pub async fn ensure_model(&self, model: &str) -> OllamaResult<()> {
        let tagged = format!("{}:", model);
        let installed = self.installed_models().await?;
        if installed.iter().any(|name| name == model || name.starts_with(&tagged)) {
            Ok(())
        } else {
            Err(OllamaError::ModelNotFound {
                model: model.to_string(),
            })
        }
    }

    /// Generate an embedding for text.
    pub async fn embed(&self, model: &str, text: &str) -> OllamaResult<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.host);
        debug!("Embedding {} chars with model {}", text.len(), model);

        let request = EmbeddingRequest {
            model: model.to_string(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let response = Self::check_status(response, model).await?;

        let embedding_response: EmbeddingResponse = response.json().await?;
        if embedding_response.embedding.is_empty() {
            return Err(OllamaError::EmptyEmbedding {
                model: model.to_string(),
            });
        }

        debug!("Generated embedding with {} dimensions", embedding_response.embedding.len());
        Ok(embedding_response.embedding)
    }

    /// Generate text (non-streaming).
    pub async fn generate(&self, request: GenerateRequest) -> OllamaResult<GenerateResponse> {
        let url = format!("{}/api/generate", self.host);
        debug!("Generating with model {}", request.model);

        let mut request = request;
        request.stream = false;

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let response = Self::check_status(response, &request.model).await?;

        let generate_response: GenerateResponse = response.json().await?;
        Ok(generate_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = OllamaConfig::default();
        let client = OllamaClient::from_config(&config).unwrap();
        assert_eq!(client.host(), "http://localhost:11434");
    }

    #[test]
    fn test_host_trailing_slash_trimmed() {
        let client = OllamaClient::new("http://example:11434/").unwrap();
        assert_eq!(client.host(), "http://example:11434");
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        // Port 9 (discard) is not an Ollama server.
        let client = OllamaClient::new("http://127.0.0.1:9").unwrap();
        let err = client.ensure_model("llama3.1:8b").await.unwrap_err();
        assert!(matches!(err, OllamaError::ServerNotRunning { .. }));

        let err = client.embed("nomic-embed-text", "hello").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
