//! Configuration commands.

use super::{get_paths, load_config};
use anyhow::{Context, Result};
use colored::Colorize;
use lore_config::{AppPaths, Config};

pub fn show() -> Result<()> {
    let paths = AppPaths::new().context("Failed to determine application directories")?;

    println!("{}", "Current Configuration".cyan().bold());
    println!("{}", "─".repeat(50));

    if paths.config_file.exists() {
        let contents =
            std::fs::read_to_string(&paths.config_file).context("Failed to read config file")?;
        println!("{}", contents);
    } else {
        println!(
            "{} No config file at {}; defaults in use:",
            "Note:".yellow(),
            paths.config_file.display()
        );
        println!();
        println!("{}", Config::default_config_string());
    }

    Ok(())
}

pub fn path() -> Result<()> {
    let config = load_config()?;
    let paths = get_paths(&config)?;

    println!("  {}: {}", "Config".cyan(), paths.config_file.display());
    println!("  {}: {}", "Database".cyan(), paths.database_file.display());

    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    let paths = AppPaths::new().context("Failed to determine application directories")?;

    let mut config = Config::load_from(&paths.config_file).context("Failed to load config")?;
    config.set_value(key, value)?;
    config.save_to(&paths.config_file).context("Failed to save config")?;

    println!("{} Set {} = {}", "✓".green(), key.cyan(), value);

    Ok(())
}
