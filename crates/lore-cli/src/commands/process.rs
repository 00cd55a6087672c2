//! Process command - work through sources registered with `ingest --queue`.

use super::{build_ingestor, get_database, load_config, short_id};
use anyhow::Result;
use colored::Colorize;
use lore_ingest::ProcessOutcome;

pub fn run(no_extract: bool, no_embed: bool) -> Result<()> {
    let config = load_config()?;
    let db = get_database(&config)?;

    let pending = db.pending_sources()?;
    if pending.is_empty() {
        println!("{}", "Nothing to process.".yellow());
        return Ok(());
    }

    println!("{} {} pending sources", "Processing:".cyan().bold(), pending.len());

    let extract = config.ingestion.extract && !no_extract;
    let embed = config.ingestion.embed && !no_embed;
    let ingestor = build_ingestor(&config, db, extract, embed)?;

    let mut done = 0;
    let mut failed = 0;
    for outcome in ingestor.process_pending()? {
        match outcome {
            ProcessOutcome::Ingested(report) => {
                done += 1;
                println!(
                    "  {} {} {} ({} chunks, {} extractions)",
                    "✓".green(),
                    report.source.title,
                    format!("[{}]", short_id(&report.source.id)).dimmed(),
                    report.chunks,
                    report.extractions
                );
            }
            ProcessOutcome::Failed { path, error } => {
                failed += 1;
                println!("  {} {} {}", "✗".red(), path, error.dimmed());
            }
        }
    }

    println!();
    println!("{} {} sources", "Processed:".green().bold(), done);
    if failed > 0 {
        println!("{} {} sources", "Failed:".red().bold(), failed);
    }

    Ok(())
}
