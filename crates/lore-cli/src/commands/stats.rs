//! Stats command - show store statistics.

use super::{format_size, get_database, load_config};
use anyhow::Result;
use colored::Colorize;
use lore_core::ExtractionType;
use lore_db::Database;

pub fn run() -> Result<()> {
    let config = load_config()?;
    let db = get_database(&config)?;
    run_with_db(&db)
}

/// Run stats with an existing database connection.
pub fn run_with_db(db: &Database) -> Result<()> {
    let stats = db.get_stats()?;

    println!("{}", "Lore Statistics".cyan().bold());
    println!("{}", "─".repeat(50));

    println!();
    println!("{}", "Sources".white().bold());
    println!("  Total: {}", stats.total_sources.to_string().green());
    for status in ["complete", "pending", "processing", "failed"] {
        if let Some(count) = stats.sources_by_status.get(status) {
            let count = if status == "failed" {
                count.to_string().red()
            } else {
                count.to_string().normal()
            };
            println!("    {}: {}", status, count);
        }
    }

    println!();
    println!("{}", "Knowledge".white().bold());
    println!("  Chunks: {}", stats.total_chunks);
    println!("  Extractions: {}", stats.total_extractions.to_string().green());
    for extraction_type in ExtractionType::ALL {
        if let Some(count) = stats.extractions_by_type.get(extraction_type.as_str()) {
            println!("    {}: {}", extraction_type.plural(), count);
        }
    }
    println!("  Topics: {}", stats.total_topics);

    let top = db.topic_counts(Some(10))?;
    if !top.is_empty() {
        let top: Vec<String> = top
            .iter()
            .map(|(topic, count)| format!("{} ({})", topic, count))
            .collect();
        println!("    Top: {}", top.join(", ").yellow());
    }

    println!();
    println!("{}", "Vectors".white().bold());
    println!("  Chunks: {} / {}", stats.embedded_chunks, stats.total_chunks);
    println!(
        "  Extractions: {} / {}",
        stats.embedded_extractions, stats.total_extractions
    );

    println!();
    println!("{}", "Storage".white().bold());
    println!("  Database size: {}", format_size(stats.database_size_bytes));
    println!("  Schema version: {}", db.schema_version()?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_on_empty_store() {
        let db = Database::open_in_memory().unwrap();
        run_with_db(&db).unwrap();
    }
}
