//! CLI command implementations.

pub mod compare;
pub mod config;
pub mod delete;
pub mod embed;
pub mod extract;
pub mod extractions;
pub mod ingest;
pub mod init;
pub mod process;
pub mod search;
pub mod serve;
pub mod show;
pub mod sources;
pub mod stats;

use anyhow::{Context, Result};
use colored::Colorize;
use lore_config::{AppPaths, Config};
use lore_core::{ExtractionType, IngestionStatus, SourceType};
use lore_db::Database;
use lore_ingest::{ChunkConfig, Ingestor, LlmExtractor, OllamaEmbedder};
use lore_query::QueryService;

/// Load the configuration, falling back to defaults when no file exists.
pub fn load_config() -> Result<Config> {
    Config::load().context("Failed to load configuration")
}

/// Get the application paths, honoring `general.data_dir`.
pub fn get_paths(config: &Config) -> Result<AppPaths> {
    config
        .paths()
        .context("Failed to determine application directories")
}

/// Get a database connection, ensuring lore is initialized.
pub fn get_database(config: &Config) -> Result<Database> {
    let paths = get_paths(config)?;

    if !paths.is_initialized() {
        anyhow::bail!("Lore is not initialized. Run 'lore init' first.");
    }

    Database::open(&paths.database_file).context("Failed to open database")
}

pub fn query_service(config: &Config, db: Database) -> QueryService {
    QueryService::new(db, config.search.clone())
}

/// Build an ingestor with the Ollama-backed stages that are switched on.
///
/// Extraction is required when requested. Embedding is not: without Ollama
/// the pipeline still stores chunks and `lore embed` can fill vectors later.
pub fn build_ingestor(config: &Config, db: Database, extract: bool, embed: bool) -> Result<Ingestor> {
    let mut ingestor = Ingestor::new(db, ChunkConfig::from_ingestion_config(&config.ingestion));

    if extract {
        let extractor = LlmExtractor::from_config(config).with_context(|| {
            format!(
                "Extraction needs Ollama at {} with model '{}' (use --no-extract to skip)",
                config.ollama.host, config.ollama.model
            )
        })?;
        ingestor = ingestor.with_extractor(Box::new(extractor));
    }

    if embed {
        match OllamaEmbedder::from_config(config) {
            Ok(embedder) => ingestor = ingestor.with_embedder(Box::new(embedder)),
            Err(e) => println!(
                "{} Embeddings skipped ({}). Run {} later.",
                "Note:".yellow(),
                e,
                "lore embed".cyan()
            ),
        }
    }

    Ok(ingestor)
}

pub fn parse_extraction_type(name: &str) -> Result<ExtractionType> {
    ExtractionType::from_str(name).with_context(|| {
        let valid: Vec<&str> = ExtractionType::ALL.iter().map(|t| t.as_str()).collect();
        format!("Unknown extraction type '{}' (valid: {})", name, valid.join(", "))
    })
}

pub fn parse_source_type(name: &str) -> Result<SourceType> {
    SourceType::from_str(name).with_context(|| {
        let valid: Vec<&str> = SourceType::ALL.iter().map(|t| t.as_str()).collect();
        format!("Unknown source type '{}' (valid: {})", name, valid.join(", "))
    })
}

pub fn parse_status(name: &str) -> Result<IngestionStatus> {
    IngestionStatus::from_str(name).with_context(|| {
        format!(
            "Unknown status '{}' (valid: pending, processing, complete, failed)",
            name
        )
    })
}

/// First eight characters of an id, for display.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn status_label(status: IngestionStatus) -> colored::ColoredString {
    match status {
        IngestionStatus::Pending => status.as_str().yellow(),
        IngestionStatus::Processing => status.as_str().cyan(),
        IngestionStatus::Complete => status.as_str().green(),
        IngestionStatus::Failed => status.as_str().red(),
    }
}

/// Format a file size in human-readable form.
pub fn format_size(bytes: i64) -> String {
    const KB: i64 = 1024;
    const MB: i64 = KB * 1024;
    const GB: i64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_extraction_type("warnings").unwrap(), ExtractionType::Warning);
        assert_eq!(parse_source_type("paper").unwrap(), SourceType::Paper);
        assert_eq!(parse_status("failed").unwrap(), IngestionStatus::Failed);

        let err = parse_extraction_type("recipe").unwrap_err().to_string();
        assert!(err.contains("methodology"));
    }
}
