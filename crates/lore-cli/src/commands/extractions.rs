//! Extractions command - list extracted knowledge of one type.

use super::{get_database, load_config, parse_extraction_type, query_service, short_id};
use anyhow::Result;
use colored::Colorize;
use lore_core::ExtractionContent;
use lore_query::ExtractionDetail;

pub fn run(
    extraction_type: &str,
    topic: Option<String>,
    source: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    let extraction_type = parse_extraction_type(extraction_type)?;
    let config = load_config()?;
    let query = query_service(&config, get_database(&config)?);

    let results = query.get_by_type(extraction_type, topic.as_deref(), source.as_deref(), limit)?;

    println!(
        "{} ({})",
        extraction_type.plural().to_uppercase().cyan().bold(),
        results.len()
    );
    println!("{}", "─".repeat(70));

    if results.is_empty() {
        println!("{}", "No extractions found.".yellow());
        return Ok(());
    }

    for detail in &results {
        print_detail(detail);
    }

    Ok(())
}

/// Print one extraction with its citation and fields.
pub fn print_detail(detail: &ExtractionDetail) {
    let extraction = &detail.extraction;

    println!(
        "{} {} {}",
        "•".cyan(),
        extraction.title.white().bold(),
        format!("[{}]", short_id(&extraction.id)).dimmed()
    );
    println!(
        "  {} {} · {}",
        "From:".dimmed(),
        detail.source_title,
        detail.position
    );
    if !extraction.topics.is_empty() {
        println!("  {} {}", "Topics:".dimmed(), extraction.topics.join(", ").yellow());
    }
    print_content(&extraction.content);
    println!();
}

fn print_field(name: &str, value: &str) {
    if !value.trim().is_empty() {
        println!("  {} {}", format!("{}:", name).cyan(), value);
    }
}

fn print_list(name: &str, values: &[String], numbered: bool) {
    if values.is_empty() {
        return;
    }
    println!("  {}", format!("{}:", name).cyan());
    for (i, value) in values.iter().enumerate() {
        if numbered {
            println!("    {}. {}", i + 1, value);
        } else {
            println!("    - {}", value);
        }
    }
}

fn print_content(content: &ExtractionContent) {
    match content {
        ExtractionContent::Decision { context, options, recommendation, rationale } => {
            print_field("Context", context);
            print_list("Options", options, false);
            print_field("Recommendation", recommendation);
            print_field("Rationale", rationale);
        }
        ExtractionContent::Pattern { problem, solution, applicability, consequences } => {
            print_field("Problem", problem);
            print_field("Solution", solution);
            print_field("Applicability", applicability);
            print_field("Consequences", consequences);
        }
        ExtractionContent::Warning { pitfall, symptoms, mitigation, severity } => {
            print_field("Pitfall", pitfall);
            print_list("Symptoms", symptoms, false);
            print_field("Mitigation", mitigation);
            print_field("Severity", severity.as_str());
        }
        ExtractionContent::Methodology { goal, steps, outcomes } => {
            print_field("Goal", goal);
            print_list("Steps", steps, true);
            print_field("Outcomes", outcomes);
        }
        ExtractionContent::Checklist { purpose, items } => {
            print_field("Purpose", purpose);
            print_list("Items", items, false);
        }
        ExtractionContent::Persona { role, responsibilities, expertise } => {
            print_field("Role", role);
            print_list("Responsibilities", responsibilities, false);
            print_list("Expertise", expertise, false);
        }
        ExtractionContent::Workflow { trigger, steps, outputs } => {
            print_field("Trigger", trigger);
            print_list("Steps", steps, true);
            print_list("Outputs", outputs, false);
        }
    }
}
