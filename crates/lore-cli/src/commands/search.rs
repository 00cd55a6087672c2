//! Search command implementation.

use super::{get_database, load_config, parse_extraction_type, query_service, short_id};
use anyhow::Result;
use colored::Colorize;
use lore_config::Config;
use lore_ingest::{Embedder, OllamaEmbedder};
use lore_query::{HitKind, SearchHit, SearchRequest};
use tracing::debug;

pub fn run(
    query: &str,
    types: &[String],
    source: Option<String>,
    topic: Option<String>,
    limit: Option<usize>,
    include_chunks: bool,
) -> Result<()> {
    if query.trim().is_empty() {
        anyhow::bail!("Search query must not be empty");
    }

    let config = load_config()?;
    let service = query_service(&config, get_database(&config)?);

    let types = types
        .iter()
        .map(|t| parse_extraction_type(t))
        .collect::<Result<Vec<_>>>()?;

    let mut request = SearchRequest::new(query)
        .with_types(types)
        .include_chunks(include_chunks);
    request.source_id = source;
    request.topic = topic;
    request.limit = limit;

    let vector = embed_query(&config, query);
    let hits = service.search(&request, vector.as_deref())?;

    let mode = if vector.is_some() { "hybrid" } else { "full-text" };
    println!(
        "{} \"{}\" {}",
        "Search:".cyan().bold(),
        query,
        format!("({})", mode).dimmed()
    );
    println!("{}", "─".repeat(70));

    if hits.is_empty() {
        println!("{}", "No results found.".yellow());
        println!();
        println!("{}", "Tips:".white().bold());
        println!("  • Try broader terms or drop the --type/--topic filters");
        println!("  • Check what is ingested with {}", "lore sources".cyan());
        return Ok(());
    }

    for hit in &hits {
        print_hit(hit);
    }

    println!("{} {} results", "Found:".green().bold(), hits.len());
    Ok(())
}

/// Embed the query for hybrid search. `None` means full-text only.
fn embed_query(config: &Config, query: &str) -> Option<Vec<f32>> {
    let embedder = match OllamaEmbedder::from_config(config) {
        Ok(embedder) => embedder,
        Err(e) => {
            debug!("Embedder unavailable: {}", e);
            println!(
                "{} Ollama not reachable, using full-text search only.",
                "Note:".yellow()
            );
            return None;
        }
    };

    match embedder.embed(query) {
        Ok(vector) => Some(vector),
        Err(e) => {
            println!(
                "{} Query embedding failed ({}), using full-text search only.",
                "Note:".yellow(),
                e
            );
            None
        }
    }
}

fn print_hit(hit: &SearchHit) {
    let label = match (hit.kind, hit.extraction_type) {
        (HitKind::Extraction, Some(t)) => t.as_str().to_uppercase(),
        _ => "PASSAGE".to_string(),
    };
    let heading = hit.title.clone().unwrap_or_else(|| hit.position.to_string());

    println!(
        "{} {} {} {}",
        "•".cyan(),
        label.magenta().bold(),
        heading.white().bold(),
        format!("[{}]", short_id(&hit.id)).dimmed()
    );
    println!(
        "  {} {} · {}",
        "From:".dimmed(),
        hit.source_title,
        hit.position
    );
    if !hit.topics.is_empty() {
        println!("  {} {}", "Topics:".dimmed(), hit.topics.join(", ").yellow());
    }
    println!("  {} {:.0}%", "Score:".dimmed(), hit.score * 100.0);
    println!("  {}", hit.snippet.dimmed());
    println!();
}
