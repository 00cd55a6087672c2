//! The query service.

use crate::error::{QueryError, QueryResult};
use crate::types::*;
use lore_config::SearchConfig;
use lore_core::{
    normalize_topics, Chunk, ChunkPosition, Extraction, ExtractionType, IngestionStatus, Source, SourceType,
};
use lore_db::{fts_query, Database, DbError, ExtractionFilter};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Upper bound on results for any single request.
pub const MAX_LIMIT: usize = 50;

/// How many candidates each retriever contributes per requested result.
const CANDIDATE_FACTOR: usize = 4;
const SNIPPET_CHARS: usize = 240;
const COMPARE_PER_SOURCE: usize = 100;

/// A record found by full-text and/or vector search, before ranking.
struct Scored<T> {
    item: T,
    text: f32,
    vector: Option<f32>,
}

impl<T> Scored<T> {
    fn new(item: T) -> Self {
        Self {
            item,
            text: 0.0,
            vector: None,
        }
    }

    fn score(&self, vector_weight: Option<f32>) -> f32 {
        match vector_weight {
            Some(w) => w * self.vector.unwrap_or(0.0) + (1.0 - w) * self.text,
            None => self.text,
        }
    }
}

enum Candidate {
    Extraction(Extraction),
    Chunk(Chunk),
}

impl Candidate {
    fn kind(&self) -> HitKind {
        match self {
            Candidate::Extraction(_) => HitKind::Extraction,
            Candidate::Chunk(_) => HitKind::Chunk,
        }
    }

    fn id(&self) -> &str {
        match self {
            Candidate::Extraction(e) => &e.id,
            Candidate::Chunk(c) => &c.id,
        }
    }
}

/// Read-only retrieval over the store.
#[derive(Clone)]
pub struct QueryService {
    db: Database,
    config: SearchConfig,
}

impl QueryService {
    pub fn new(db: Database, config: SearchConfig) -> Self {
        Self { db, config }
    }

    pub fn with_defaults(db: Database) -> Self {
        Self::new(db, SearchConfig::default())
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The effective result count for a requested limit.
    pub fn clamp_limit(&self, limit: Option<usize>) -> usize {
        limit.unwrap_or(self.config.default_limit).clamp(1, MAX_LIMIT)
    }

    /// Rank extractions (and optionally chunks) against a query.
    ///
    /// With a query vector the score is `w * cosine + (1 - w) * fts`,
    /// otherwise the full-text score alone. Equal scores put extractions
    /// before chunks, then order by id.
    pub fn search(&self, request: &SearchRequest, query_vector: Option<&[f32]>) -> QueryResult<Vec<SearchHit>> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(QueryError::InvalidRequest("query must not be empty".to_string()));
        }

        let limit = self.clamp_limit(request.limit);
        let source_id = match request.source_id.as_deref() {
            Some(prefix) => Some(self.db.get_source_by_prefix(prefix)?.id),
            None => None,
        };
        let topic = request.topic.as_deref().map(normalize_topic).transpose()?;
        let fts = fts_query(query);
        let vector_weight = query_vector.map(|_| self.config.vector_weight.clamp(0.0, 1.0));

        let filter = ExtractionFilter {
            types: request.types.clone(),
            source_id: source_id.clone(),
            topic: topic.clone(),
            limit: Some(limit * CANDIDATE_FACTOR),
        };

        let mut extractions: HashMap<String, Scored<Extraction>> = HashMap::new();
        if let Some(fts) = &fts {
            for m in self.db.search_extractions_fts(fts, &filter)? {
                extractions
                    .entry(m.extraction.id.clone())
                    .or_insert_with(|| Scored::new(m.extraction))
                    .text = m.score;
            }
        }
        if let Some(vector) = query_vector {
            for m in self
                .db
                .vector_search_extractions(vector, &filter, self.config.min_similarity)?
            {
                extractions
                    .entry(m.extraction.id.clone())
                    .or_insert_with(|| Scored::new(m.extraction))
                    .vector = Some(m.score);
            }
        }

        // Chunks carry no type or topic, so any such filter rules them out
        let search_chunks = request.include_chunks && request.types.is_empty() && topic.is_none();
        let mut chunks: HashMap<String, Scored<Chunk>> = HashMap::new();
        if search_chunks {
            if let Some(fts) = &fts {
                for m in self
                    .db
                    .search_chunks_fts(fts, source_id.as_deref(), limit * CANDIDATE_FACTOR)?
                {
                    chunks
                        .entry(m.chunk.id.clone())
                        .or_insert_with(|| Scored::new(m.chunk))
                        .text = m.score;
                }
            }
            if let Some(vector) = query_vector {
                for m in self.db.vector_search_chunks(
                    vector,
                    source_id.as_deref(),
                    limit * CANDIDATE_FACTOR,
                    self.config.min_similarity,
                )? {
                    chunks
                        .entry(m.chunk.id.clone())
                        .or_insert_with(|| Scored::new(m.chunk))
                        .vector = Some(m.score);
                }
            }
        }

        let mut ranked: Vec<(f32, Candidate)> = extractions
            .into_values()
            .map(|s| (s.score(vector_weight), Candidate::Extraction(s.item)))
            .chain(
                chunks
                    .into_values()
                    .map(|s| (s.score(vector_weight), Candidate::Chunk(s.item))),
            )
            .collect();

        ranked.sort_by(|(score_a, a), (score_b, b)| {
            score_b
                .total_cmp(score_a)
                .then_with(|| a.kind().cmp(&b.kind()))
                .then_with(|| a.id().cmp(b.id()))
        });
        ranked.truncate(limit);

        debug!(
            "Search '{}' returned {} hits ({})",
            query,
            ranked.len(),
            if vector_weight.is_some() { "hybrid" } else { "fulltext" }
        );

        let mut titles = HashMap::new();
        ranked
            .into_iter()
            .map(|(score, candidate)| self.to_hit(score, candidate, &mut titles))
            .collect()
    }

    /// Extractions of one type, newest first.
    pub fn get_by_type(
        &self,
        extraction_type: ExtractionType,
        topic: Option<&str>,
        source_id: Option<&str>,
        limit: Option<usize>,
    ) -> QueryResult<Vec<ExtractionDetail>> {
        let mut filter = ExtractionFilter::new()
            .with_type(extraction_type)
            .with_limit(self.clamp_limit(limit));
        if let Some(topic) = topic {
            filter = filter.with_topic(normalize_topic(topic)?);
        }
        if let Some(prefix) = source_id {
            filter = filter.with_source(self.db.get_source_by_prefix(prefix)?.id);
        }

        let mut titles = HashMap::new();
        self.db
            .list_extractions(&filter)?
            .into_iter()
            .map(|e| self.detail(e, &mut titles))
            .collect()
    }

    /// One extraction by id or unique prefix, with its source title and position.
    pub fn get_extraction(&self, id: &str) -> QueryResult<ExtractionDetail> {
        let extraction = self.db.get_extraction_by_prefix(id.trim())?;
        self.detail(extraction, &mut HashMap::new())
    }

    /// Sources with their chunk and extraction counts, in title order.
    pub fn list_sources(
        &self,
        status: Option<IngestionStatus>,
        source_type: Option<SourceType>,
    ) -> QueryResult<Vec<SourceSummary>> {
        self.db
            .list_sources(status, source_type)?
            .into_iter()
            .map(|source| self.summarize(source))
            .collect()
    }

    /// One source by id or unique prefix.
    pub fn get_source(&self, id: &str) -> QueryResult<SourceSummary> {
        let source = self.db.get_source_by_prefix(id.trim())?;
        self.summarize(source)
    }

    /// Compare what 2 to 5 sources say about a topic.
    ///
    /// An extraction matches when it carries the topic tag or its text
    /// matches the topic in full-text search.
    pub fn compare_sources(&self, topic: &str, source_ids: &[String]) -> QueryResult<Comparison> {
        let topic = normalize_topic(topic)?;
        if !(2..=5).contains(&source_ids.len()) {
            return Err(QueryError::InvalidRequest(format!(
                "compare needs between 2 and 5 sources, got {}",
                source_ids.len()
            )));
        }

        let mut sources = Vec::with_capacity(source_ids.len());
        for prefix in source_ids {
            let source = self.db.get_source_by_prefix(prefix.trim())?;
            if sources.iter().any(|s: &Source| s.id == source.id) {
                return Err(QueryError::InvalidRequest(format!(
                    "source {} listed more than once",
                    source.id
                )));
            }
            sources.push(source);
        }

        let fts = fts_query(&topic);
        let mut titles = HashMap::new();
        let mut compared = Vec::with_capacity(sources.len());
        let mut shared: Option<BTreeSet<String>> = None;

        for source in sources {
            let base = ExtractionFilter::new()
                .with_source(&source.id)
                .with_limit(COMPARE_PER_SOURCE);

            let mut matched: BTreeMap<String, Extraction> = BTreeMap::new();
            for e in self.db.list_extractions(&base.clone().with_topic(&topic))? {
                matched.insert(e.id.clone(), e);
            }
            if let Some(fts) = &fts {
                for m in self.db.search_extractions_fts(fts, &base)? {
                    matched.entry(m.extraction.id.clone()).or_insert(m.extraction);
                }
            }

            let mut extractions: Vec<Extraction> = matched.into_values().collect();
            extractions.sort_by(|a, b| {
                a.extraction_type()
                    .cmp(&b.extraction_type())
                    .then_with(|| a.title.cmp(&b.title))
                    .then_with(|| a.id.cmp(&b.id))
            });

            let mut type_counts = BTreeMap::new();
            for e in &extractions {
                *type_counts.entry(e.extraction_type().as_str().to_string()).or_insert(0) += 1;
            }

            let topics: BTreeSet<String> = self.db.topics_for_source(&source.id)?.into_iter().collect();
            shared = Some(match shared {
                Some(acc) => acc.intersection(&topics).cloned().collect(),
                None => topics,
            });

            titles.insert(source.id.clone(), source.title.clone());
            let details = extractions
                .into_iter()
                .map(|e| self.detail(e, &mut titles))
                .collect::<QueryResult<Vec<_>>>()?;

            compared.push(SourceComparison {
                source_id: source.id,
                title: source.title,
                authors: source.authors,
                type_counts,
                extractions: details,
            });
        }

        Ok(Comparison {
            topic,
            sources: compared,
            shared_topics: shared.unwrap_or_default().into_iter().collect(),
        })
    }

    fn summarize(&self, source: Source) -> QueryResult<SourceSummary> {
        let (chunk_count, extraction_count) = self.db.source_counts(&source.id)?;
        Ok(SourceSummary {
            source,
            chunk_count,
            extraction_count,
        })
    }

    fn detail(&self, extraction: Extraction, titles: &mut HashMap<String, String>) -> QueryResult<ExtractionDetail> {
        let source_title = self.source_title(&extraction.source_id, titles)?;
        let position = self.chunk_position(&extraction.chunk_id)?;
        Ok(ExtractionDetail {
            extraction_type: extraction.extraction_type(),
            extraction,
            source_title,
            position,
        })
    }

    fn to_hit(&self, score: f32, candidate: Candidate, titles: &mut HashMap<String, String>) -> QueryResult<SearchHit> {
        let hit = match candidate {
            Candidate::Extraction(e) => SearchHit {
                kind: HitKind::Extraction,
                source_title: self.source_title(&e.source_id, titles)?,
                position: self.chunk_position(&e.chunk_id)?,
                score,
                extraction_type: Some(e.extraction_type()),
                snippet: snippet(&e.content.search_text(), SNIPPET_CHARS),
                title: Some(e.title),
                topics: e.topics,
                source_id: e.source_id,
                id: e.id,
            },
            Candidate::Chunk(c) => SearchHit {
                kind: HitKind::Chunk,
                source_title: self.source_title(&c.source_id, titles)?,
                score,
                extraction_type: None,
                title: None,
                topics: Vec::new(),
                snippet: snippet(&c.content, SNIPPET_CHARS),
                position: c.position,
                source_id: c.source_id,
                id: c.id,
            },
        };
        Ok(hit)
    }

    fn source_title(&self, source_id: &str, titles: &mut HashMap<String, String>) -> QueryResult<String> {
        if let Some(title) = titles.get(source_id) {
            return Ok(title.clone());
        }
        let title = self.db.get_source(source_id)?.title;
        titles.insert(source_id.to_string(), title.clone());
        Ok(title)
    }

    fn chunk_position(&self, chunk_id: &str) -> QueryResult<ChunkPosition> {
        match self.db.get_chunk(chunk_id) {
            Ok(chunk) => Ok(chunk.position),
            Err(DbError::NotFound(_)) => Ok(ChunkPosition::new()),
            Err(e) => Err(e.into()),
        }
    }
}

fn normalize_topic(topic: &str) -> QueryResult<String> {
    normalize_topics([topic])
        .into_iter()
        .next()
        .ok_or_else(|| QueryError::InvalidRequest("topic must not be empty".to_string()))
}

/// Whitespace-collapsed prefix of `text`, marked when cut.
fn snippet(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let cut: String = collapsed.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lore_core::{ExtractionContent, ExtractionDraft, Severity};
    use lore_db::OwnerKind;

    struct Fixture {
        service: QueryService,
        release_it: Source,
        sre: Source,
        timeouts: Extraction,
        breaker: Extraction,
        budgets: Extraction,
        release_chunk: Chunk,
    }

    fn draft(title: &str, topics: &[&str], content: ExtractionContent) -> ExtractionDraft {
        ExtractionDraft {
            title: title.to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            confidence: 0.8,
            content,
        }
    }

    fn fixture_with(config: SearchConfig) -> Fixture {
        let db = Database::open_in_memory().unwrap();

        let release_it = Source::new(SourceType::Book, "Release It").with_authors(vec!["Michael Nygard".into()]);
        let sre = Source::new(SourceType::Book, "Site Reliability Engineering");
        db.create_source(&release_it).unwrap();
        db.create_source(&sre).unwrap();

        let release_chunk = Chunk::new(
            release_it.id.clone(),
            0,
            "Integration points without timeouts will hang your threads.",
        )
        .with_position(ChunkPosition::new().with_chapter("Stability Antipatterns").with_page(41));
        let sre_chunk = Chunk::new(sre.id.clone(), 0, "Error budgets balance release velocity and reliability.");
        db.create_chunks(std::slice::from_ref(&release_chunk)).unwrap();
        db.create_chunks(std::slice::from_ref(&sre_chunk)).unwrap();

        let timeouts = Extraction::from_draft(
            draft(
                "Missing timeouts",
                &["reliability", "timeouts"],
                ExtractionContent::Warning {
                    pitfall: "Calls without timeouts hang threads".into(),
                    symptoms: vec!["Thread pool exhaustion".into()],
                    mitigation: "Set timeouts on every integration point".into(),
                    severity: Severity::High,
                },
            ),
            &release_chunk,
        );
        let breaker = Extraction::from_draft(
            draft(
                "Circuit breaker",
                &["reliability", "resilience"],
                ExtractionContent::Pattern {
                    problem: "Failing dependencies drag callers down".into(),
                    solution: "Stop calling after repeated failures".into(),
                    applicability: String::new(),
                    consequences: String::new(),
                },
            ),
            &release_chunk,
        );
        let budgets = Extraction::from_draft(
            draft(
                "Adopt error budgets",
                &["reliability", "slo"],
                ExtractionContent::Decision {
                    context: "Balancing launches against stability".into(),
                    options: vec!["Freeze releases".into(), "Error budgets".into()],
                    recommendation: "Use error budgets".into(),
                    rationale: "Makes the trade-off explicit".into(),
                },
            ),
            &sre_chunk,
        );
        db.create_extractions(&[timeouts.clone(), breaker.clone()]).unwrap();
        db.create_extractions(std::slice::from_ref(&budgets)).unwrap();

        Fixture {
            service: QueryService::new(db, config),
            release_it,
            sre,
            timeouts,
            breaker,
            budgets,
            release_chunk,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(SearchConfig::default())
    }

    #[test]
    fn test_empty_query_is_rejected() {
        let f = fixture();
        let result = f.service.search(&SearchRequest::new("   "), None);
        assert!(matches!(result, Err(QueryError::InvalidRequest(_))));
    }

    #[test]
    fn test_fulltext_search_finds_extractions_and_chunks() {
        let f = fixture();
        let hits = f.service.search(&SearchRequest::new("timeouts"), None).unwrap();

        assert!(hits.iter().any(|h| h.kind == HitKind::Extraction && h.id == f.timeouts.id));
        assert!(hits.iter().any(|h| h.kind == HitKind::Chunk && h.id == f.release_chunk.id));
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(hits.iter().all(|h| h.score > 0.0 && h.score < 1.0));

        let hit = hits.iter().find(|h| h.id == f.timeouts.id).unwrap();
        assert_eq!(hit.source_title, "Release It");
        assert_eq!(hit.extraction_type, Some(ExtractionType::Warning));
        assert_eq!(hit.position.page, Some(41));
    }

    #[test]
    fn test_punctuation_never_breaks_search() {
        let f = fixture();
        let hits = f
            .service
            .search(&SearchRequest::new("\"timeouts\" AND (threads* -"), None)
            .unwrap();
        assert!(!hits.is_empty());

        let none = f.service.search(&SearchRequest::new("?!"), None).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_filters_exclude_chunks_and_other_types() {
        let f = fixture();
        let request = SearchRequest::new("reliability").with_types(vec![ExtractionType::Decision]);
        let hits = f.service.search(&request, None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, f.budgets.id);

        let request = SearchRequest::new("reliability").with_source(&f.release_it.id[..8]).include_chunks(false);
        let hits = f.service.search(&request, None).unwrap();
        assert!(!hits.is_empty());
        assert!(hits
            .iter()
            .all(|h| h.source_id == f.release_it.id && h.kind == HitKind::Extraction));

        let request = SearchRequest::new("reliability").with_topic("Resilience");
        let hits = f.service.search(&request, None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, f.breaker.id);
    }

    #[test]
    fn test_unknown_source_filter_is_not_found() {
        let f = fixture();
        let request = SearchRequest::new("timeouts").with_source("does-not-exist");
        assert!(matches!(f.service.search(&request, None), Err(QueryError::NotFound(_))));
    }

    #[test]
    fn test_limit_is_clamped() {
        let f = fixture();
        let hits = f.service.search(&SearchRequest::new("reliability").with_limit(0), None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(f.service.clamp_limit(Some(1000)), MAX_LIMIT);
        assert_eq!(f.service.clamp_limit(None), 10);
    }

    #[test]
    fn test_vector_similarity_reorders_results() {
        let f = fixture();
        let db = f.service.database();
        db.store_vector(OwnerKind::Extraction, &f.timeouts.id, &[1.0, 0.0, 0.0], "test").unwrap();
        db.store_vector(OwnerKind::Extraction, &f.breaker.id, &[0.0, 1.0, 0.0], "test").unwrap();

        let request = SearchRequest::new("reliability").with_source(&f.release_it.id).include_chunks(false);
        let hits = f.service.search(&request, Some(&[0.0, 1.0, 0.0])).unwrap();

        assert_eq!(hits[0].id, f.breaker.id);
        assert!(hits[0].score > 0.7);
        // Below min_similarity, so only the text score counts
        let timeouts = hits.iter().find(|h| h.id == f.timeouts.id).unwrap();
        assert!(timeouts.score < 0.3);
    }

    #[test]
    fn test_equal_scores_put_extractions_first() {
        let config = SearchConfig {
            vector_weight: 1.0,
            ..SearchConfig::default()
        };
        let f = fixture_with(config);
        let db = f.service.database();
        db.store_vector(OwnerKind::Extraction, &f.budgets.id, &[0.5, 0.5], "test").unwrap();
        let sre_chunk = db.get_chunks_by_source(&f.sre.id).unwrap().remove(0);
        db.store_vector(OwnerKind::Chunk, &sre_chunk.id, &[0.5, 0.5], "test").unwrap();

        let hits = f.service.search(&SearchRequest::new("zzzz"), Some(&[1.0, 1.0])).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].score, hits[1].score);
        assert_eq!(hits[0].kind, HitKind::Extraction);
        assert_eq!(hits[1].kind, HitKind::Chunk);
    }

    #[test]
    fn test_get_by_type_and_detail() {
        let f = fixture();
        let warnings = f.service.get_by_type(ExtractionType::Warning, None, None, None).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].extraction.id, f.timeouts.id);
        assert_eq!(warnings[0].source_title, "Release It");
        assert_eq!(warnings[0].position.chapter.as_deref(), Some("Stability Antipatterns"));

        let none = f
            .service
            .get_by_type(ExtractionType::Warning, Some("slo"), None, None)
            .unwrap();
        assert!(none.is_empty());

        let decisions = f
            .service
            .get_by_type(ExtractionType::Decision, None, Some(&f.sre.id), Some(5))
            .unwrap();
        assert_eq!(decisions.len(), 1);

        let json = serde_json::to_value(&decisions[0]).unwrap();
        assert_eq!(json["extraction_type"], "decision");
        assert_eq!(json["content"]["recommendation"], "Use error budgets");
        assert_eq!(json["source_title"], "Site Reliability Engineering");
    }

    #[test]
    fn test_get_extraction_by_prefix() {
        let f = fixture();
        let detail = f.service.get_extraction(&f.breaker.id[..10]).unwrap();
        assert_eq!(detail.extraction.title, "Circuit breaker");
        assert_eq!(detail.position.page, Some(41));

        assert!(matches!(f.service.get_extraction("nope"), Err(QueryError::NotFound(_))));
    }

    #[test]
    fn test_list_sources_with_counts() {
        let f = fixture();
        let sources = f.service.list_sources(None, None).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source.title, "Release It");
        assert_eq!(sources[0].chunk_count, 1);
        assert_eq!(sources[0].extraction_count, 2);
        assert_eq!(sources[1].extraction_count, 1);

        let failed = f.service.list_sources(Some(IngestionStatus::Failed), None).unwrap();
        assert!(failed.is_empty());
    }

    #[test]
    fn test_compare_sources() {
        let f = fixture();
        let ids = vec![f.release_it.id.clone(), f.sre.id[..8].to_string()];
        let comparison = f.service.compare_sources("Reliability", &ids).unwrap();

        assert_eq!(comparison.topic, "reliability");
        assert_eq!(comparison.sources.len(), 2);
        assert_eq!(comparison.sources[0].extractions.len(), 2);
        assert_eq!(comparison.sources[0].type_counts.get("warning"), Some(&1));
        assert_eq!(comparison.sources[0].type_counts.get("pattern"), Some(&1));
        assert_eq!(comparison.sources[1].extractions.len(), 1);
        assert_eq!(comparison.shared_topics, vec!["reliability"]);
    }

    #[test]
    fn test_compare_sources_validation() {
        let f = fixture();
        let one = vec![f.release_it.id.clone()];
        assert!(matches!(
            f.service.compare_sources("reliability", &one),
            Err(QueryError::InvalidRequest(_))
        ));

        let six = vec![f.release_it.id.clone(); 6];
        assert!(matches!(
            f.service.compare_sources("reliability", &six),
            Err(QueryError::InvalidRequest(_))
        ));

        let dup = vec![f.release_it.id.clone(), f.release_it.id.clone()];
        assert!(matches!(
            f.service.compare_sources("reliability", &dup),
            Err(QueryError::InvalidRequest(_))
        ));

        let unknown = vec![f.release_it.id.clone(), "missing".to_string()];
        assert!(matches!(
            f.service.compare_sources("reliability", &unknown),
            Err(QueryError::NotFound(_))
        ));

        let ids = vec![f.release_it.id.clone(), f.sre.id.clone()];
        assert!(matches!(
            f.service.compare_sources("  ", &ids),
            Err(QueryError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_snippet() {
        assert_eq!(snippet("a  b\n\nc", 10), "a b c");
        assert_eq!(snippet("abcdefghij klm", 10), "abcdefghij...");
    }
}
