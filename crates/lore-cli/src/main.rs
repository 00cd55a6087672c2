//! Lore CLI - knowledge extraction and retrieval for engineering sources

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Lore - turn books, papers and docs into searchable engineering knowledge
#[derive(Parser)]
#[command(name = "lore")]
#[command(version)]
#[command(about = "Extract decisions, patterns and warnings from technical sources and serve them to agents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Lore (create config and database)
    Init,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Ingest a file or directory
    Ingest {
        /// Path to a PDF, Markdown or text file, or a directory of them
        path: String,

        /// Title to use instead of the one found in the file
        #[arg(long)]
        title: Option<String>,

        /// Author (can be specified multiple times)
        #[arg(short, long = "author")]
        authors: Vec<String>,

        /// Source type (book, paper, article, documentation, notes, other)
        #[arg(short = 't', long = "type")]
        source_type: Option<String>,

        /// Only ingest files whose name matches this glob (directories only)
        #[arg(short, long)]
        pattern: Option<String>,

        /// Skip LLM extraction
        #[arg(long)]
        no_extract: bool,

        /// Skip embeddings
        #[arg(long)]
        no_embed: bool,

        /// Show what would be ingested without actually ingesting
        #[arg(long)]
        dry_run: bool,

        /// Register as pending instead of processing now (see `lore process`)
        #[arg(short, long)]
        queue: bool,
    },

    /// Process sources registered with `ingest --queue`
    Process {
        /// Skip LLM extraction
        #[arg(long)]
        no_extract: bool,

        /// Skip embeddings
        #[arg(long)]
        no_embed: bool,
    },

    /// Re-run extraction for a source
    Extract {
        /// Source ID (or prefix)
        source: String,
    },

    /// Embed chunks and extractions that have no vector yet
    Embed {
        /// Records fetched per batch
        #[arg(long, default_value = "32")]
        batch_size: usize,
    },

    /// List ingested sources
    Sources {
        /// Filter by status (pending, processing, complete, failed)
        #[arg(short, long)]
        status: Option<String>,

        /// Filter by source type
        #[arg(short = 't', long = "type")]
        source_type: Option<String>,
    },

    /// Show details of a source
    Show {
        /// Source ID (or prefix)
        source: String,
    },

    /// Search extracted knowledge and source passages
    Search {
        /// Search query
        query: String,

        /// Only these extraction types (can be specified multiple times)
        #[arg(short = 't', long = "type")]
        types: Vec<String>,

        /// Only this source (ID or prefix)
        #[arg(short, long)]
        source: Option<String>,

        /// Only extractions tagged with this topic
        #[arg(long)]
        topic: Option<String>,

        /// Maximum results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Include raw passages (default)
        #[arg(long, overrides_with = "no_chunks")]
        chunks: bool,

        /// Only return extractions
        #[arg(long, overrides_with = "chunks")]
        no_chunks: bool,
    },

    /// List extractions of one type
    Extractions {
        /// Extraction type (decision, pattern, warning, methodology, checklist, persona, workflow)
        extraction_type: String,

        /// Only extractions tagged with this topic
        #[arg(long)]
        topic: Option<String>,

        /// Only this source (ID or prefix)
        #[arg(short, long)]
        source: Option<String>,

        /// Maximum results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Compare what several sources say about a topic
    Compare {
        /// Topic tag
        topic: String,

        /// Two to five source IDs (or prefixes)
        #[arg(required = true, num_args = 2..=5)]
        sources: Vec<String>,
    },

    /// Delete a source with its chunks, extractions and vectors
    Delete {
        /// Source ID (or prefix)
        source: String,
    },

    /// Show store statistics
    Stats,

    /// Run the MCP server on stdin/stdout
    Serve,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the config and database locations
    Path,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., ollama.model)
        key: String,

        /// Value to set
        value: String,
    },
}

fn init_logging(verbose: bool, to_stderr: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lore=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lore=info,warn"))
    };

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the protocol while serving
    if to_stderr {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, matches!(cli.command, Commands::Serve));

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(),
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Set { key, value } => commands::config::set(&key, &value),
        },
        Commands::Ingest {
            path,
            title,
            authors,
            source_type,
            pattern,
            no_extract,
            no_embed,
            dry_run,
            queue,
        } => commands::ingest::run(
            &path,
            commands::ingest::IngestArgs {
                title,
                authors,
                source_type,
                pattern,
                no_extract,
                no_embed,
                dry_run,
                queue,
            },
        ),
        Commands::Process { no_extract, no_embed } => commands::process::run(no_extract, no_embed),
        Commands::Extract { source } => commands::extract::run(&source),
        Commands::Embed { batch_size } => commands::embed::run(batch_size),
        Commands::Sources { status, source_type } => commands::sources::run(status, source_type),
        Commands::Show { source } => commands::show::run(&source),
        Commands::Search {
            query,
            types,
            source,
            topic,
            limit,
            chunks: _,
            no_chunks,
        } => commands::search::run(&query, &types, source, topic, limit, !no_chunks),
        Commands::Extractions {
            extraction_type,
            topic,
            source,
            limit,
        } => commands::extractions::run(&extraction_type, topic, source, limit),
        Commands::Compare { topic, sources } => commands::compare::run(&topic, &sources),
        Commands::Delete { source } => commands::delete::run(&source),
        Commands::Stats => commands::stats::run(),
        Commands::Serve => commands::serve::run(),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
