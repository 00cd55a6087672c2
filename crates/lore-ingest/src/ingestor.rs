//! Main ingestion logic.

use crate::chunker::{ChunkConfig, Chunker};
use crate::embedder::Embedder;
use crate::error::{IngestError, IngestResult};
use crate::extractor::KnowledgeExtractor;
use crate::parsers::{self, title_from_path};
use lore_core::{Chunk, Extraction, IngestionStatus, Source, SourceType};
use lore_db::{Database, OwnerKind};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Caller-supplied values that override what the parser finds.
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    pub title: Option<String>,
    pub authors: Vec<String>,
    /// Defaults from the file extension.
    pub source_type: Option<SourceType>,
}

impl SourceOptions {
    fn apply(&self, source: &mut Source) {
        if let Some(title) = &self.title {
            source.title = title.clone();
        }
        if !self.authors.is_empty() {
            source.authors = self.authors.clone();
        }
        if let Some(source_type) = self.source_type {
            source.source_type = source_type;
        }
    }
}

/// Result of ingesting one source.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub source: Source,
    pub chunks: usize,
    pub extractions: usize,
    /// Vectors stored during this run.
    pub embedded: usize,
    /// Chunks whose extraction call failed.
    pub extraction_failures: usize,
    /// The content was already ingested and nothing was done.
    pub skipped: bool,
    /// An existing source was re-ingested in place.
    pub was_update: bool,
}

/// Per-file result of a batch run.
#[derive(Debug)]
pub enum ProcessOutcome {
    Ingested(IngestReport),
    Failed { path: String, error: String },
}

/// Result of backfilling vectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedReport {
    pub chunks: usize,
    pub extractions: usize,
    pub failed: usize,
}

/// Drives sources through parse, chunk, extract and embed.
pub struct Ingestor {
    db: Database,
    chunker: Chunker,
    extractor: Option<Box<dyn KnowledgeExtractor>>,
    embedder: Option<Box<dyn Embedder>>,
}

impl Ingestor {
    /// Create a new ingestor without an extractor or embedder.
    pub fn new(db: Database, chunk_config: ChunkConfig) -> Self {
        Self {
            db,
            chunker: Chunker::new(chunk_config),
            extractor: None,
            embedder: None,
        }
    }

    /// Create an ingestor with default chunking config.
    pub fn with_defaults(db: Database) -> Self {
        Self::new(db, ChunkConfig::default())
    }

    pub fn with_extractor(mut self, extractor: Box<dyn KnowledgeExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_embedder(mut self, embedder: Box<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Ingest a single file.
    ///
    /// Content that is already ingested is skipped. A known path with new
    /// content, or one whose last run failed, is re-ingested under the same id.
    pub fn ingest_file(&self, path: &Path, options: &SourceOptions) -> IngestResult<IngestReport> {
        let (path, source_type) = resolve_file(path)?;
        let path_str = path.to_string_lossy().to_string();
        info!("Ingesting file: {}", path_str);

        let content_hash = hash_file(&path)?;
        let by_path = self.db.find_source_by_path(&path_str)?;

        // A known path is only skipped for its own content
        let unchanged = match &by_path {
            Some(existing) if existing.content_hash.as_deref() == Some(content_hash.as_str()) => {
                Some(existing.clone())
            }
            Some(_) => None,
            None => self.db.find_source_by_hash(&content_hash)?,
        };
        if let Some(existing) = unchanged.filter(|s| s.status == IngestionStatus::Complete) {
            debug!("Content already ingested as {}", existing.id);
            return self.skipped_report(existing);
        }

        let (mut source, was_update) = match by_path {
            Some(mut existing) => {
                debug!("Re-ingesting existing source {}", existing.id);
                let was_update = existing.status != IngestionStatus::Pending;
                if existing.status == IngestionStatus::Processing {
                    existing.mark_failed("interrupted")?;
                }
                existing.content_hash = Some(content_hash.clone());
                options.apply(&mut existing);
                self.db.update_source(&existing)?;
                (existing, was_update)
            }
            None => {
                let source = new_source(&path, &path_str, source_type, &content_hash, options);
                self.db.create_source(&source)?;
                (source, false)
            }
        };

        let keep_title = options.title.is_some();
        let mut report = self.run(&mut source, |ingestor, source| {
            ingestor.process(source, &path, keep_title)
        })?;
        report.was_update = was_update;
        Ok(report)
    }

    /// Record a file as a `pending` source without processing it.
    ///
    /// A path that is already known returns the existing source unchanged.
    pub fn register_file(&self, path: &Path, options: &SourceOptions) -> IngestResult<Source> {
        let (path, source_type) = resolve_file(path)?;
        let path_str = path.to_string_lossy().to_string();

        if let Some(existing) = self.db.find_source_by_path(&path_str)? {
            debug!("Already registered: {}", path_str);
            return Ok(existing);
        }

        let content_hash = hash_file(&path)?;
        let source = new_source(&path, &path_str, source_type, &content_hash, options);
        self.db.create_source(&source)?;

        info!("Registered source for processing: {}", path_str);
        Ok(source)
    }

    /// Process every pending source, oldest first, continuing past failures.
    pub fn process_pending(&self) -> IngestResult<Vec<ProcessOutcome>> {
        let mut outcomes = Vec::new();

        for mut source in self.db.pending_sources()? {
            let Some(path) = source.path.clone() else {
                outcomes.push(ProcessOutcome::Failed {
                    path: source.title.clone(),
                    error: IngestError::MissingPath(source.id.clone()).to_string(),
                });
                continue;
            };
            let path_buf = PathBuf::from(&path);

            // A title that differs from the file stem was chosen by the user
            let keep_title = title_from_path(&path_buf).as_deref() != Some(source.title.as_str());

            let result = self.run(&mut source, |ingestor, source| {
                source.content_hash = Some(hash_file(&path_buf)?);
                ingestor.process(source, &path_buf, keep_title)
            });

            match result {
                Ok(report) => outcomes.push(ProcessOutcome::Ingested(report)),
                Err(e) => outcomes.push(ProcessOutcome::Failed {
                    path,
                    error: e.to_string(),
                }),
            }
        }

        Ok(outcomes)
    }

    /// Delete and regenerate the extractions of an already chunked source.
    pub fn reextract(&self, source_id: &str) -> IngestResult<IngestReport> {
        if self.extractor.is_none() {
            return Err(IngestError::Extraction("no extractor configured".to_string()));
        }

        let mut source = self.db.get_source(source_id)?;
        info!("Re-extracting knowledge from '{}'", source.title);

        self.run(&mut source, |ingestor, source| {
            let chunks = ingestor.db.get_chunks_by_source(&source.id)?;
            let removed = ingestor.db.delete_extractions_by_source(&source.id)?;
            debug!("Removed {} old extractions", removed);

            let (extractions, failures) = ingestor.extract_chunks(source, &chunks)?;
            let embedded = ingestor.embed_records(&[], &extractions)?;
            ingestor.complete(source)?;

            Ok(IngestReport {
                source: source.clone(),
                chunks: chunks.len(),
                extractions: extractions.len(),
                embedded,
                extraction_failures: failures,
                skipped: false,
                was_update: true,
            })
        })
    }

    /// Embed every chunk and extraction that has no vector yet.
    pub fn embed_missing(&self, batch_size: usize) -> IngestResult<EmbedReport> {
        let embedder = self
            .embedder
            .as_deref()
            .ok_or_else(|| IngestError::Embedding("no embedder configured".to_string()))?;
        let batch_size = batch_size.max(1);

        let mut report = EmbedReport::default();

        // Failed records keep their place in the order, so skip past them
        let mut skip = 0;
        loop {
            let chunks = self.db.unembedded_chunks(batch_size, skip)?;
            if chunks.is_empty() {
                break;
            }
            for chunk in &chunks {
                if self.embed_one(embedder, OwnerKind::Chunk, &chunk.id, &chunk.content)? {
                    report.chunks += 1;
                } else {
                    skip += 1;
                }
            }
        }
        report.failed += skip;

        let mut skip = 0;
        loop {
            let extractions = self.db.unembedded_extractions(batch_size, skip)?;
            if extractions.is_empty() {
                break;
            }
            for extraction in &extractions {
                let text = extraction.embedding_text();
                if self.embed_one(embedder, OwnerKind::Extraction, &extraction.id, &text)? {
                    report.extractions += 1;
                } else {
                    skip += 1;
                }
            }
        }
        report.failed += skip;

        info!(
            "Embedded {} chunks and {} extractions ({} failed)",
            report.chunks, report.extractions, report.failed
        );
        Ok(report)
    }

    /// Ingest every supported file under `dir`.
    ///
    /// `on_file` is called after each file with its outcome.
    pub fn ingest_directory<F>(
        &self,
        dir: &Path,
        pattern: Option<&str>,
        options: &SourceOptions,
        mut on_file: F,
    ) -> IngestResult<Vec<ProcessOutcome>>
    where
        F: FnMut(&Path, &ProcessOutcome),
    {
        // One title cannot name many files
        let options = SourceOptions {
            title: None,
            ..options.clone()
        };

        let mut outcomes = Vec::new();
        for path in collect_files(dir, pattern)? {
            let outcome = match self.ingest_file(&path, &options) {
                Ok(report) => ProcessOutcome::Ingested(report),
                Err(e) => {
                    warn!("Failed to ingest {:?}: {}", path, e);
                    ProcessOutcome::Failed {
                        path: path.to_string_lossy().to_string(),
                        error: e.to_string(),
                    }
                }
            };
            on_file(&path, &outcome);
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    /// Move `source` to processing, run `work`, and record a failure if it errors.
    fn run<F>(&self, source: &mut Source, work: F) -> IngestResult<IngestReport>
    where
        F: FnOnce(&Self, &mut Source) -> IngestResult<IngestReport>,
    {
        source.start_processing()?;
        self.db.update_source(source)?;

        match work(self, source) {
            Ok(report) => Ok(report),
            Err(e) => {
                warn!("Ingestion of '{}' failed: {}", source.title, e);
                if source.mark_failed(e.to_string()).is_ok() {
                    if let Err(update_err) = self.db.update_source(source) {
                        warn!("Could not record failure for {}: {}", source.id, update_err);
                    }
                }
                Err(e)
            }
        }
    }

    fn process(&self, source: &mut Source, path: &Path, keep_title: bool) -> IngestResult<IngestReport> {
        let document = parsers::parse_file(path)?;
        if !keep_title {
            if let Some(title) = &document.title {
                source.title = title.clone();
            }
        }
        source.metadata = document.metadata.clone();

        // Extractions and vectors go with their chunks
        self.db.delete_extractions_by_source(&source.id)?;
        self.db.delete_chunks_by_source(&source.id)?;

        let chunks = self.chunker.chunk_document(&source.id, &document);
        self.db.create_chunks(&chunks)?;
        debug!("Stored {} chunks for source {}", chunks.len(), source.id);

        let (extractions, failures) = self.extract_chunks(source, &chunks)?;
        let embedded = self.embed_records(&chunks, &extractions)?;
        self.complete(source)?;

        info!(
            "Ingested '{}': {} chunks, {} extractions, {} vectors",
            source.title,
            chunks.len(),
            extractions.len(),
            embedded
        );

        Ok(IngestReport {
            source: source.clone(),
            chunks: chunks.len(),
            extractions: extractions.len(),
            embedded,
            extraction_failures: failures,
            skipped: false,
            was_update: false,
        })
    }

    fn complete(&self, source: &mut Source) -> IngestResult<()> {
        let mut done = source.clone();
        done.mark_complete()?;
        self.db.update_source(&done)?;
        *source = done;
        Ok(())
    }

    /// Run the extractor over each chunk, storing results per chunk.
    ///
    /// Returns the stored extractions and the number of chunks whose call failed.
    /// An Ollama error stops the run so the source is marked failed.
    fn extract_chunks(&self, source: &Source, chunks: &[Chunk]) -> IngestResult<(Vec<Extraction>, usize)> {
        let Some(extractor) = &self.extractor else {
            return Ok((Vec::new(), 0));
        };

        let mut all = Vec::new();
        let mut failures = 0;

        for chunk in chunks {
            match extractor.extract(source, chunk) {
                Ok(drafts) => {
                    let extractions: Vec<Extraction> = drafts
                        .into_iter()
                        .map(|draft| Extraction::from_draft(draft, chunk))
                        .collect();
                    if !extractions.is_empty() {
                        self.db.create_extractions(&extractions)?;
                        all.extend(extractions);
                    }
                }
                Err(e @ IngestError::Ollama(_)) => return Err(e),
                Err(e) => {
                    failures += 1;
                    warn!(
                        "Extraction failed for chunk {} of '{}': {}",
                        chunk.chunk_index, source.title, e
                    );
                }
            }
        }

        Ok((all, failures))
    }

    fn embed_records(&self, chunks: &[Chunk], extractions: &[Extraction]) -> IngestResult<usize> {
        let Some(embedder) = self.embedder.as_deref() else {
            return Ok(0);
        };

        let mut stored = 0;
        for chunk in chunks {
            if self.embed_one(embedder, OwnerKind::Chunk, &chunk.id, &chunk.content)? {
                stored += 1;
            }
        }
        for extraction in extractions {
            let text = extraction.embedding_text();
            if self.embed_one(embedder, OwnerKind::Extraction, &extraction.id, &text)? {
                stored += 1;
            }
        }
        Ok(stored)
    }

    /// Embed and store one vector. Embedding failures are logged and reported as `false`.
    fn embed_one(&self, embedder: &dyn Embedder, kind: OwnerKind, owner_id: &str, text: &str) -> IngestResult<bool> {
        match embedder.embed(text) {
            Ok(vector) => {
                self.db.store_vector(kind, owner_id, &vector, embedder.model())?;
                Ok(true)
            }
            Err(e) => {
                warn!("Failed to embed {} {}: {}", kind.as_str(), owner_id, e);
                Ok(false)
            }
        }
    }

    fn skipped_report(&self, source: Source) -> IngestResult<IngestReport> {
        let (chunks, extractions) = self.db.source_counts(&source.id)?;
        Ok(IngestReport {
            source,
            chunks: chunks as usize,
            extractions: extractions as usize,
            embedded: 0,
            extraction_failures: 0,
            skipped: true,
            was_update: false,
        })
    }
}

/// Supported files under `dir`, sorted, skipping hidden entries.
///
/// `pattern` is a glob matched against each file name.
pub fn collect_files(dir: &Path, pattern: Option<&str>) -> IngestResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::FileNotFound(dir.to_path_buf()));
    }

    let pattern = pattern
        .map(|p| {
            glob::Pattern::new(p).map_err(|e| IngestError::InvalidPattern {
                pattern: p.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()?;

    let mut files = Vec::new();
    let walker = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name().to_str()));

    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() || !parsers::is_supported(path) {
            continue;
        }

        if let Some(pattern) = &pattern {
            let name = entry.file_name().to_string_lossy();
            if !pattern.matches(&name) {
                continue;
            }
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    debug!("Found {} files under {:?}", files.len(), dir);
    Ok(files)
}

fn is_hidden(name: Option<&str>) -> bool {
    name.map(|n| n.starts_with('.')).unwrap_or(false)
}

/// Canonicalize `path` and work out its source type, rejecting unsupported files.
fn resolve_file(path: &Path) -> IngestResult<(PathBuf, SourceType)> {
    if !path.exists() {
        return Err(IngestError::FileNotFound(path.to_path_buf()));
    }
    let path = path.canonicalize()?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("unknown")
        .to_string();
    let source_type =
        SourceType::from_extension(&extension).ok_or(IngestError::UnsupportedFileType(extension))?;

    Ok((path, source_type))
}

fn new_source(
    path: &Path,
    path_str: &str,
    source_type: SourceType,
    content_hash: &str,
    options: &SourceOptions,
) -> Source {
    let title = title_from_path(path).unwrap_or_else(|| "Untitled".to_string());
    let mut source = Source::new(source_type, title)
        .with_path(path_str)
        .with_content_hash(content_hash);
    options.apply(&mut source);
    source
}

/// SHA-256 of the file contents, hex encoded.
fn hash_file(path: &Path) -> IngestResult<String> {
    let content = std::fs::read(path)?;
    let digest = Sha256::digest(&content);
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}
