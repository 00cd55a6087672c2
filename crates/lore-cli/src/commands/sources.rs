//! Sources command - list ingested sources.

use super::{get_database, load_config, parse_source_type, parse_status, query_service, short_id, status_label};
use anyhow::Result;
use colored::Colorize;
use lore_query::QueryService;

pub fn run(status: Option<String>, source_type: Option<String>) -> Result<()> {
    let config = load_config()?;
    let query = query_service(&config, get_database(&config)?);
    run_with_query(&query, status.as_deref(), source_type.as_deref())
}

/// Run sources with an existing query service.
pub fn run_with_query(query: &QueryService, status: Option<&str>, source_type: Option<&str>) -> Result<()> {
    let status = status.map(parse_status).transpose()?;
    let source_type = source_type.map(parse_source_type).transpose()?;

    let sources = query.list_sources(status, source_type)?;

    if sources.is_empty() {
        println!("{}", "No sources found.".yellow());
        println!("  Add one with {}", "lore ingest <path>".cyan());
        return Ok(());
    }

    println!("{} ({})", "Sources".cyan().bold(), sources.len());
    println!("{}", "─".repeat(70));

    for summary in &sources {
        let source = &summary.source;
        println!(
            "{} {} {}",
            "•".cyan(),
            source.title.white().bold(),
            format!("[{}]", short_id(&source.id)).dimmed()
        );

        let mut line = format!("  {} · {}", source.source_type, status_label(source.status));
        if !source.authors.is_empty() {
            line.push_str(&format!(" · {}", source.authors.join(", ")));
        }
        println!("{}", line);
        println!(
            "  {} chunks, {} extractions",
            summary.chunk_count,
            summary.extraction_count.to_string().green()
        );
        if let Some(error) = &source.error {
            println!("  {} {}", "Error:".red(), error);
        }
    }

    Ok(())
}
