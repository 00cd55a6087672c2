//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub ingestion: IngestionConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> ConfigResult<Self> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&paths.config_file)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> ConfigResult<()> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&paths.config_file)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::default_config_string())?;
        Ok(())
    }

    /// Application paths, honoring `general.data_dir`.
    pub fn paths(&self) -> ConfigResult<AppPaths> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Ok(match &self.general.data_dir {
            Some(dir) => paths.with_data_dir(dir),
            None => paths,
        })
    }

    /// Reject settings that cannot work together.
    pub fn validate(&self) -> ConfigResult<()> {
        let ingestion = &self.ingestion;
        if ingestion.chunk_size == 0 {
            return Err(ConfigError::Invalid("ingestion.chunk_size must be > 0".into()));
        }
        if ingestion.chunk_overlap >= ingestion.chunk_size {
            return Err(ConfigError::Invalid(
                "ingestion.chunk_overlap must be smaller than ingestion.chunk_size".into(),
            ));
        }
        if ingestion.max_extractions_per_chunk == 0 {
            return Err(ConfigError::Invalid(
                "ingestion.max_extractions_per_chunk must be > 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&ingestion.extraction_temperature) {
            return Err(ConfigError::Invalid(
                "ingestion.extraction_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        let search = &self.search;
        if search.default_limit == 0 {
            return Err(ConfigError::Invalid("search.default_limit must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&search.vector_weight) {
            return Err(ConfigError::Invalid("search.vector_weight must be between 0.0 and 1.0".into()));
        }
        if !(0.0..=1.0).contains(&search.min_similarity) {
            return Err(ConfigError::Invalid("search.min_similarity must be between 0.0 and 1.0".into()));
        }

        if self.ollama.timeout_seconds == 0 {
            return Err(ConfigError::Invalid("ollama.timeout_seconds must be > 0".into()));
        }

        Ok(())
    }

    /// Set a value by dotted key, e.g. `ollama.model`.
    ///
    /// The config is left untouched if the result would not validate.
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let mut next = self.clone();
        next.apply(key, value)?;
        next.validate()?;
        *self = next;
        Ok(())
    }

    fn apply(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
            value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("cannot parse '{}'", value),
            })
        }

        match key {
            "general.data_dir" => {
                self.general.data_dir = if value.trim().is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            "ollama.host" => self.ollama.host = value.to_string(),
            "ollama.model" => self.ollama.model = value.to_string(),
            "ollama.embedding_model" => self.ollama.embedding_model = value.to_string(),
            "ollama.timeout_seconds" => self.ollama.timeout_seconds = parse(key, value)?,
            "ingestion.chunk_size" => self.ingestion.chunk_size = parse(key, value)?,
            "ingestion.chunk_overlap" => self.ingestion.chunk_overlap = parse(key, value)?,
            "ingestion.extract" => self.ingestion.extract = parse(key, value)?,
            "ingestion.embed" => self.ingestion.embed = parse(key, value)?,
            "ingestion.min_extract_chars" => self.ingestion.min_extract_chars = parse(key, value)?,
            "ingestion.max_extractions_per_chunk" => {
                self.ingestion.max_extractions_per_chunk = parse(key, value)?
            }
            "ingestion.extraction_retries" => self.ingestion.extraction_retries = parse(key, value)?,
            "ingestion.extraction_temperature" => {
                self.ingestion.extraction_temperature = parse(key, value)?
            }
            "search.default_limit" => self.search.default_limit = parse(key, value)?,
            "search.min_similarity" => self.search.min_similarity = parse(key, value)?,
            "search.vector_weight" => self.search.vector_weight = parse(key, value)?,
            "server.name" => self.server.name = value.to_string(),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# Lore Configuration
# Knowledge extraction and retrieval for engineering sources

[general]
# Data directory for the database
# data_dir = "~/.local/share/lore"

[ollama]
# Ollama server address
host = "http://localhost:11434"

# Model used to extract structured knowledge at ingestion time
model = "llama3.1:8b"

# Model for generating embeddings
embedding_model = "nomic-embed-text"

# Request timeout in seconds
timeout_seconds = 180

[ingestion]
# Text chunking (tokens, roughly 4 characters each)
chunk_size = 500
chunk_overlap = 50

# Run the LLM extractor and the embedder while ingesting
extract = true
embed = true

# Chunks shorter than this are not sent to the extractor
min_extract_chars = 200

# Upper bound on records kept from one chunk
max_extractions_per_chunk = 6

# Retries when the model returns malformed JSON
extraction_retries = 2

extraction_temperature = 0.1

[search]
default_limit = 10
min_similarity = 0.2

# Weight of vector similarity in hybrid search (the rest is full-text)
vector_weight = 0.7

[server]
# Name reported to MCP clients
name = "lore"
"#
        .to_string()
    }
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub data_dir: Option<String>,
}

/// Ollama LLM settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    pub embedding_model: String,
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            model: "llama3.1:8b".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            timeout_seconds: 180,
        }
    }
}

/// Ingestion pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub extract: bool,
    pub embed: bool,
    pub min_extract_chars: usize,
    pub max_extractions_per_chunk: usize,
    pub extraction_retries: usize,
    pub extraction_temperature: f32,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            extract: true,
            embed: true,
            min_extract_chars: 200,
            max_extractions_per_chunk: 6,
            extraction_retries: 2,
            extraction_temperature: 0.1,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub min_similarity: f32,
    pub vector_weight: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            min_similarity: 0.2,
            vector_weight: 0.7,
        }
    }
}

/// MCP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "lore".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ollama.host, "http://localhost:11434");
        assert!(config.ingestion.extract);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_string_matches_defaults() {
        let parsed: Config = toml::from_str(&Config::default_config_string()).unwrap();
        let defaults = Config::default();

        assert_eq!(parsed.ollama.model, defaults.ollama.model);
        assert_eq!(parsed.ingestion.chunk_size, defaults.ingestion.chunk_size);
        assert_eq!(parsed.search.vector_weight, defaults.search.vector_weight);
        assert_eq!(parsed.server.name, defaults.server.name);
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
            [ollama]
            model = "mistral"

            [search]
            default_limit = 25
            "#
        )
        .unwrap();

        let config = Config::load_from(temp_file.path()).unwrap();

        assert_eq!(config.ollama.model, "mistral");
        assert_eq!(config.search.default_limit, 25);
        // Defaults should still work
        assert_eq!(config.ollama.host, "http://localhost:11434");
        assert_eq!(config.ingestion.chunk_overlap, 50);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
            [ingestion]
            chunk_size = 100
            chunk_overlap = 100
            "#
        )
        .unwrap();

        assert!(matches!(
            Config::load_from(temp_file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.search.default_limit, 10);
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::default();
        config.set_value("ollama.model", "qwen2.5").unwrap();
        config.set_value("search.vector_weight", "0.5").unwrap();
        config.set_value("ingestion.extract", "false").unwrap();

        assert_eq!(config.ollama.model, "qwen2.5");
        assert_eq!(config.search.vector_weight, 0.5);
        assert!(!config.ingestion.extract);

        assert!(matches!(
            config.set_value("search.nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            config.set_value("search.default_limit", "many"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(config.set_value("search.vector_weight", "1.5").is_err());
        assert_eq!(config.search.vector_weight, 0.5);
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.server.name = "team-lore".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server.name, "team-lore");
    }
}
