//! Embed command - generate vectors for chunks and extractions that lack one.

use super::{build_ingestor, get_database, load_config};
use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

pub fn run(batch_size: usize) -> Result<()> {
    let config = load_config()?;
    let db = get_database(&config)?;

    let stats = db.get_stats()?;
    println!("{}", "Embedding Statistics".cyan().bold());
    println!("{}", "─".repeat(40));
    println!(
        "Chunks: {} / {}",
        stats.embedded_chunks.to_string().green(),
        stats.total_chunks
    );
    println!(
        "Extractions: {} / {}",
        stats.embedded_extractions.to_string().green(),
        stats.total_extractions
    );

    let remaining = (stats.total_chunks - stats.embedded_chunks)
        + (stats.total_extractions - stats.embedded_extractions);
    if remaining == 0 {
        println!("\n{} Everything has an embedding.", "✓".green());
        return Ok(());
    }

    let ingestor = build_ingestor(&config, db, false, false)?;
    let embedder = lore_ingest::OllamaEmbedder::from_config(&config).map_err(|e| {
        anyhow::anyhow!(
            "{}. Start Ollama and run 'ollama pull {}'.",
            e,
            config.ollama.embedding_model
        )
    })?;
    let ingestor = ingestor.with_embedder(Box::new(embedder));

    println!(
        "\n{} {} records with '{}'",
        "Embedding:".cyan().bold(),
        remaining,
        config.ollama.embedding_model
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message("Generating embeddings");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let report = ingestor.embed_missing(batch_size.max(1));
    pb.finish_and_clear();
    let report = report?;

    println!(
        "{} {} chunks, {} extractions",
        "Done:".green().bold(),
        report.chunks.to_string().green(),
        report.extractions.to_string().green()
    );
    if report.failed > 0 {
        println!("{} {} records failed to embed", "Warning:".yellow(), report.failed);
    }

    Ok(())
}
