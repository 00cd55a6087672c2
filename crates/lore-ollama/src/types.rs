//! Types for Ollama API requests and responses.

use serde::{Deserialize, Serialize};

/// One entry of `/api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
}

/// Request body for /api/generate endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// `"json"` constrains the model to emit a single JSON value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

impl GenerateRequest {
    /// Create a new generation request.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            format: None,
            stream: false,
            options: None,
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Ask for JSON output.
    pub fn with_json_format(mut self) -> Self {
        self.format = Some("json".to_string());
        self
    }

    /// Set generation options.
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// Options for text generation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Cap on generated tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_num_predict(mut self, num_predict: i32) -> Self {
        self.num_predict = Some(num_predict);
        self
    }
}

/// Non-streaming `/api/generate` result.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub model: String,
    pub response: String,
    /// False when generation stopped at `num_predict`.
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub done_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_serialization() {
        let request = GenerateRequest::new("llama3.1:8b", "Extract knowledge")
            .with_system("You extract knowledge.")
            .with_json_format()
            .with_options(GenerateOptions::new().with_temperature(0.1));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3.1:8b");
        assert_eq!(json["format"], "json");
        assert_eq!(json["stream"], false);
        assert!((json["options"]["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert!(json["options"].get("num_predict").is_none());
    }

    #[test]
    fn test_list_models_tolerates_missing_field() {
        let list: ListModelsResponse = serde_json::from_str("{}").unwrap();
        assert!(list.models.is_empty());

        let list: ListModelsResponse =
            serde_json::from_str(r#"{"models":[{"name":"nomic-embed-text:latest","size":274302450}]}"#).unwrap();
        assert_eq!(list.models[0].name, "nomic-embed-text:latest");
    }

    #[test]
    fn test_plain_request_omits_format() {
        let json = serde_json::to_value(GenerateRequest::new("m", "p")).unwrap();
        assert!(json.get("format").is_none());
        assert!(json.get("system").is_none());
    }
}
