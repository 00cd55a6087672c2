//! Error types for the MCP server.

use lore_query::QueryError;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Failures of the server itself (transport, setup).
#[derive(Error, Debug)]
pub enum McpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ollama error: {0}")]
    Ollama(#[from] lore_ollama::OllamaError),
}

pub type McpResult<T> = Result<T, McpError>;

/// Machine-readable reason a tool call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorCode {
    InvalidArguments,
    NotFound,
    StoreUnavailable,
    EmbeddingUnavailable,
    UnknownTool,
}

impl ToolErrorCode {
    /// Whether calling again unchanged may succeed.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            ToolErrorCode::StoreUnavailable | ToolErrorCode::EmbeddingUnavailable
        )
    }

    fn default_hint(&self) -> &'static str {
        match self {
            ToolErrorCode::InvalidArguments => "Check the tool's input schema and fix the arguments.",
            ToolErrorCode::NotFound => "Use list_sources or search_knowledge to find valid ids.",
            ToolErrorCode::StoreUnavailable => "The knowledge store could not be read. Retry shortly.",
            ToolErrorCode::EmbeddingUnavailable => "Semantic search is unavailable. Retry later or rely on full-text results.",
            ToolErrorCode::UnknownTool => "Call tools/list to see the available tools.",
        }
    }
}

/// A tool failure reported to the client as an `isError` result.
#[derive(Debug, Clone)]
pub struct ToolError {
    pub code: ToolErrorCode,
    pub message: String,
    pub hint: String,
}

impl ToolError {
    pub fn new(code: ToolErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            hint: code.default_hint().to_string(),
        }
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ToolErrorCode::InvalidArguments, message)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code,
                "message": self.message,
                "retryable": self.code.retryable(),
                "hint": self.hint,
            }
        })
    }
}

impl From<QueryError> for ToolError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NotFound(what) => ToolError::new(ToolErrorCode::NotFound, what),
            QueryError::InvalidRequest(why) => ToolError::invalid_arguments(why),
            QueryError::Store(e) => ToolError::new(ToolErrorCode::StoreUnavailable, e.to_string()),
        }
    }
}
