//! Initialize Lore.

use super::{get_paths, load_config};
use anyhow::{Context, Result};
use colored::Colorize;
use lore_config::Config;
use lore_db::Database;

pub fn run() -> Result<()> {
    let config = load_config()?;
    let paths = get_paths(&config)?;

    if paths.is_initialized() {
        println!("{} Lore is already initialized.", "Note:".yellow().bold());
        println!("  Config: {}", paths.config_file.display());
        println!("  Database: {}", paths.database_file.display());
        return Ok(());
    }

    println!("{}", "Initializing Lore...".cyan().bold());

    paths.ensure_dirs().context("Failed to create directories")?;
    println!("  {} Created directories", "✓".green());

    if paths.config_file.exists() {
        println!("  {} Kept existing config: {}", "✓".green(), paths.config_file.display());
    } else {
        Config::create_default_file(&paths.config_file).context("Failed to create config file")?;
        println!("  {} Created config: {}", "✓".green(), paths.config_file.display());
    }

    let _db = Database::open(&paths.database_file).context("Failed to initialize database")?;
    println!("  {} Created database: {}", "✓".green(), paths.database_file.display());

    println!();
    println!("{}", "Lore initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Pull the models: {}", format!("ollama pull {}", config.ollama.model).cyan());
    println!("  2. Ingest a book: {}", "lore ingest ~/books/release-it.pdf".cyan());
    println!("  3. Search it: {}", "lore search \"circuit breaker\"".cyan());
    println!("  4. Serve it to agents: {}", "lore serve".cyan());

    Ok(())
}
