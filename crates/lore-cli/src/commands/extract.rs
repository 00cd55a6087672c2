//! Extract command - re-run knowledge extraction for one source.

use super::{build_ingestor, get_database, load_config};
use super::ingest::print_report;
use anyhow::Result;
use colored::Colorize;

pub fn run(source_id: &str) -> Result<()> {
    let config = load_config()?;
    let db = get_database(&config)?;
    let source = db.get_source_by_prefix(source_id)?;

    println!("{} {}", "Extracting:".cyan().bold(), source.title);

    let ingestor = build_ingestor(&config, db, true, config.ingestion.embed)?;
    let report = ingestor.reextract(&source.id)?;

    print_report(&report);
    Ok(())
}
