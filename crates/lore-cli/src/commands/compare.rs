//! Compare command - what several sources say about one topic.

use super::{get_database, load_config, query_service, short_id};
use anyhow::Result;
use colored::Colorize;

pub fn run(topic: &str, sources: &[String]) -> Result<()> {
    let config = load_config()?;
    let query = query_service(&config, get_database(&config)?);

    let comparison = query.compare_sources(topic, sources)?;

    println!("{} {}", "Compare:".cyan().bold(), comparison.topic.white().bold());
    println!("{}", "─".repeat(70));

    for source in &comparison.sources {
        println!();
        println!(
            "{} {} {}",
            "📚".cyan(),
            source.title.white().bold(),
            format!("[{}]", short_id(&source.source_id)).dimmed()
        );
        if !source.authors.is_empty() {
            println!("  {}", source.authors.join(", ").dimmed());
        }

        if source.extractions.is_empty() {
            println!("  {}", "Nothing on this topic.".yellow());
            continue;
        }

        let counts: Vec<String> = source
            .type_counts
            .iter()
            .map(|(name, count)| format!("{} {}", count, name))
            .collect();
        println!("  {}", counts.join(", "));

        for detail in &source.extractions {
            println!(
                "    {} {} {} {}",
                "•".cyan(),
                detail.extraction_type.as_str().magenta(),
                detail.extraction.title,
                format!("({})", detail.position).dimmed()
            );
        }
    }

    println!();
    if comparison.shared_topics.is_empty() {
        println!("{} none", "Shared topics:".white().bold());
    } else {
        println!(
            "{} {}",
            "Shared topics:".white().bold(),
            comparison.shared_topics.join(", ").yellow()
        );
    }

    Ok(())
}
