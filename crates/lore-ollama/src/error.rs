//! Error types for Ollama operations.

use thiserror::Error;

/// Errors that can occur when interacting with Ollama.
#[derive(Error, Debug)]
pub enum OllamaError {
    /// Request timeout.
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// The requested model is not available.
    #[error("Model not found: {model}. Run 'ollama pull {model}' to download it.")]
    ModelNotFound { model: String },

    /// Ollama server is not running.
    #[error("Ollama server is not running at {host}. Start it with 'ollama serve'.")]
    ServerNotRunning { host: String },

    /// API returned an error response.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The server answered with something other than the expected payload.
    #[error("Empty embedding returned by model {model}")]
    EmptyEmbedding { model: String },

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OllamaError {
    /// Whether trying the same call again later might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            OllamaError::Timeout { .. } | OllamaError::ServerNotRunning { .. } => true,
            OllamaError::ApiError { status, .. } => *status >= 500,
            OllamaError::Http(e) => e.is_timeout() || e.is_connect(),
            OllamaError::ModelNotFound { .. }
            | OllamaError::EmptyEmbedding { .. }
            | OllamaError::Json(_) => false,
        }
    }
}

/// Result type for Ollama operations.
pub type OllamaResult<T> = Result<T, OllamaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(OllamaError::Timeout { seconds: 5 }.is_retryable());
        assert!(OllamaError::ServerNotRunning { host: "h".into() }.is_retryable());
        assert!(OllamaError::ApiError { status: 503, message: String::new() }.is_retryable());
        assert!(!OllamaError::ApiError { status: 400, message: String::new() }.is_retryable());
        assert!(!OllamaError::ModelNotFound { model: "m".into() }.is_retryable());
    }
}
