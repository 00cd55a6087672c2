//! Delete command - remove a source and everything derived from it.

use super::{get_database, load_config, short_id};
use anyhow::Result;
use colored::Colorize;
use lore_db::Database;

pub fn run(id: &str) -> Result<()> {
    let config = load_config()?;
    let db = get_database(&config)?;
    run_with_db(&db, id)
}

/// Run delete with an existing database connection.
pub fn run_with_db(db: &Database, id: &str) -> Result<()> {
    let source = db.get_source_by_prefix(id)?;
    let (chunks, extractions) = db.source_counts(&source.id)?;

    db.delete_source(&source.id)?;

    println!(
        "{} {} {} ({} chunks, {} extractions)",
        "Deleted:".green().bold(),
        source.title,
        format!("[{}]", short_id(&source.id)).dimmed(),
        chunks,
        extractions
    );

    Ok(())
}
