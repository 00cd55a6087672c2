//! Show command - display source details.

use super::{get_database, load_config, query_service, status_label};
use anyhow::Result;
use colored::Colorize;
use lore_core::ExtractionType;
use lore_db::ExtractionFilter;
use lore_query::QueryService;
use std::collections::HashMap;

pub fn run(id: &str) -> Result<()> {
    let config = load_config()?;
    let query = query_service(&config, get_database(&config)?);
    run_with_query(&query, id)
}

/// Run show with an existing query service.
pub fn run_with_query(query: &QueryService, id: &str) -> Result<()> {
    let summary = query.get_source(id)?;
    let source = &summary.source;
    let db = query.database();

    println!("📚 {}", source.title.white().bold());
    println!("{}", "─".repeat(70));

    println!("  {}: {}", "ID".cyan(), source.id);
    println!("  {}: {}", "Type".cyan(), source.source_type);
    println!("  {}: {}", "Status".cyan(), status_label(source.status));
    if !source.authors.is_empty() {
        println!("  {}: {}", "Authors".cyan(), source.authors.join(", "));
    }
    println!(
        "  {}: {}",
        "Created".cyan(),
        source.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(ingested) = source.ingested_at {
        println!("  {}: {}", "Ingested".cyan(), ingested.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(path) = &source.path {
        println!("  {}: {}", "Path".cyan(), path);
    }
    if let Some(hash) = &source.content_hash {
        println!("  {}: {}", "Hash".cyan(), hash);
    }
    if let Some(error) = &source.error {
        println!("  {}: {}", "Error".red(), error);
    }

    println!();
    println!("{}", "Knowledge".white().bold());
    println!("  Chunks: {}", summary.chunk_count);
    println!("  Extractions: {}", summary.extraction_count.to_string().green());

    let extractions = db.list_extractions(&ExtractionFilter::new().with_source(source.id.clone()))?;
    let mut counts: HashMap<ExtractionType, usize> = HashMap::new();
    for extraction in &extractions {
        *counts.entry(extraction.extraction_type()).or_default() += 1;
    }
    for extraction_type in ExtractionType::ALL {
        if let Some(count) = counts.get(&extraction_type) {
            println!("    {}: {}", extraction_type.plural(), count);
        }
    }

    let topics = db.topics_for_source(&source.id)?;
    if !topics.is_empty() {
        println!("  Topics: {}", topics.join(", ").yellow());
    }

    if !source.metadata.is_null() && source.metadata != serde_json::json!({}) {
        println!();
        println!("{}", "Metadata".white().bold());
        println!("{}", serde_json::to_string_pretty(&source.metadata)?);
    }

    Ok(())
}
