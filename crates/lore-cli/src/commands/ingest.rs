//! Ingest command implementation.

use super::{build_ingestor, get_database, load_config, parse_source_type, short_id};
use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use lore_core::SourceType;
use lore_ingest::{collect_files, IngestReport, ProcessOutcome, SourceOptions};
use std::path::Path;

/// Flags of `lore ingest`.
pub struct IngestArgs {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub source_type: Option<String>,
    pub pattern: Option<String>,
    pub no_extract: bool,
    pub no_embed: bool,
    pub dry_run: bool,
    pub queue: bool,
}

/// Ingest a single file or directory.
pub fn run(path: &str, args: IngestArgs) -> Result<()> {
    let config = load_config()?;

    let path = Path::new(path);
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    let source_type = args.source_type.as_deref().map(parse_source_type).transpose()?;
    let mut options = SourceOptions {
        title: args.title.clone(),
        authors: args.authors.clone(),
        source_type,
    };

    let files = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        if options.title.take().is_some() {
            println!("{} --title is ignored for directories.", "Note:".yellow());
        }
        println!("{} {}", "Scanning:".cyan(), path.display());
        collect_files(path, args.pattern.as_deref())?
    };

    if files.is_empty() {
        println!("{}", "No supported files found.".yellow());
        return Ok(());
    }

    if args.dry_run {
        for file in &files {
            let detected = options
                .source_type
                .or_else(|| {
                    file.extension()
                        .and_then(|e| e.to_str())
                        .and_then(SourceType::from_extension)
                })
                .map(|t| t.to_string())
                .unwrap_or_else(|| "unsupported".to_string());
            println!("  {} {} [{}]", "Would ingest:".cyan(), file.display(), detected);
        }
        println!("\n{}", "Dry run - no files were ingested.".cyan());
        return Ok(());
    }

    let db = get_database(&config)?;

    if args.queue {
        let ingestor = build_ingestor(&config, db, false, false)?;
        let mut queued = 0;
        for file in &files {
            match ingestor.register_file(file, &options) {
                Ok(source) => {
                    println!(
                        "{} {} {}",
                        "Queued:".green().bold(),
                        file.display(),
                        format!("[{}]", short_id(&source.id)).dimmed()
                    );
                    queued += 1;
                }
                Err(e) => println!("{} {}: {}", "Failed:".red().bold(), file.display(), e),
            }
        }
        println!("\n{} sources pending. Run {} to process them.", queued, "lore process".cyan());
        return Ok(());
    }

    let extract = config.ingestion.extract && !args.no_extract;
    let embed = config.ingestion.embed && !args.no_embed;
    let ingestor = build_ingestor(&config, db, extract, embed)?;

    if let [file] = files.as_slice() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.set_message(format!("Ingesting {}", file.display()));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        let result = ingestor.ingest_file(file, &options);
        pb.finish_and_clear();

        print_report(&result?);
        return Ok(());
    }

    println!("Found {} files", files.len());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let outcomes = ingestor.ingest_directory(path, args.pattern.as_deref(), &options, |file, _| {
        let filename = file.file_name().and_then(|n| n.to_str()).unwrap_or("file");
        pb.set_message(filename.to_string());
        pb.inc(1);
    })?;

    let mut ingested = 0;
    let mut skipped = 0;
    let mut failed: Vec<(&str, &str)> = Vec::new();
    for outcome in &outcomes {
        match outcome {
            ProcessOutcome::Ingested(report) if report.skipped => skipped += 1,
            ProcessOutcome::Ingested(_) => ingested += 1,
            ProcessOutcome::Failed { path, error } => failed.push((path.as_str(), error.as_str())),
        }
    }

    pb.finish_and_clear();

    println!("\n{} {} files", "Ingested:".green().bold(), ingested);
    if skipped > 0 {
        println!("{} {} files (unchanged)", "Skipped:".yellow().bold(), skipped);
    }
    if !failed.is_empty() {
        println!("{} {} files", "Failed:".red().bold(), failed.len());
        for (file, error) in &failed {
            println!("  {} {}", file, error.dimmed());
        }
    }

    Ok(())
}

/// Print the outcome of ingesting one source.
pub fn print_report(report: &IngestReport) {
    let source = &report.source;

    if report.skipped {
        println!(
            "{} {} (unchanged since last ingestion)",
            "Skipped:".yellow().bold(),
            source.title
        );
        println!("  ID: {}", source.id);
        return;
    }

    println!(
        "{} {}",
        if report.was_update { "Updated:" } else { "Ingested:" }.green().bold(),
        source.title
    );
    println!("  ID: {}", source.id);
    println!("  Type: {}", source.source_type);
    if !source.authors.is_empty() {
        println!("  Authors: {}", source.authors.join(", "));
    }
    println!("  Chunks: {}", report.chunks);
    println!("  Extractions: {}", report.extractions.to_string().green());
    println!("  Embedded: {}", report.embedded);
    if report.extraction_failures > 0 {
        println!(
            "  {} {} chunks could not be extracted (see log)",
            "Warning:".yellow(),
            report.extraction_failures
        );
    }
}
