//! Structured knowledge extracted from chunks.

use crate::error::{Error, Result};
use crate::types::{new_id, Chunk, ChunkId, ExtractionId, SourceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of topic tags kept on an extraction.
pub const MAX_TOPICS: usize = 8;

/// The seven kinds of structured knowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionType {
    Decision,
    Pattern,
    Warning,
    Methodology,
    Checklist,
    Persona,
    Workflow,
}

impl ExtractionType {
    pub const ALL: [ExtractionType; 7] = [
        ExtractionType::Decision,
        ExtractionType::Pattern,
        ExtractionType::Warning,
        ExtractionType::Methodology,
        ExtractionType::Checklist,
        ExtractionType::Persona,
        ExtractionType::Workflow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionType::Decision => "decision",
            ExtractionType::Pattern => "pattern",
            ExtractionType::Warning => "warning",
            ExtractionType::Methodology => "methodology",
            ExtractionType::Checklist => "checklist",
            ExtractionType::Persona => "persona",
            ExtractionType::Workflow => "workflow",
        }
    }

    /// Plural form, as used in tool names like `get_decisions`.
    pub fn plural(&self) -> &'static str {
        match self {
            ExtractionType::Decision => "decisions",
            ExtractionType::Pattern => "patterns",
            ExtractionType::Warning => "warnings",
            ExtractionType::Methodology => "methodologies",
            ExtractionType::Checklist => "checklists",
            ExtractionType::Persona => "personas",
            ExtractionType::Workflow => "workflows",
        }
    }

    /// Parse singular or plural names, case-insensitively.
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s || t.plural() == s)
    }
}

impl std::fmt::Display for ExtractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Type-specific content of an extraction.
///
/// The variant is the extraction type, so the populated fields always match it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExtractionContent {
    Decision {
        context: String,
        #[serde(default)]
        options: Vec<String>,
        recommendation: String,
        #[serde(default)]
        rationale: String,
    },
    Pattern {
        problem: String,
        solution: String,
        #[serde(default)]
        applicability: String,
        #[serde(default)]
        consequences: String,
    },
    Warning {
        pitfall: String,
        #[serde(default)]
        symptoms: Vec<String>,
        mitigation: String,
        #[serde(default)]
        severity: Severity,
    },
    Methodology {
        goal: String,
        steps: Vec<String>,
        #[serde(default)]
        outcomes: String,
    },
    Checklist {
        purpose: String,
        items: Vec<String>,
    },
    Persona {
        role: String,
        #[serde(default)]
        responsibilities: Vec<String>,
        #[serde(default)]
        expertise: Vec<String>,
    },
    Workflow {
        trigger: String,
        steps: Vec<String>,
        #[serde(default)]
        outputs: Vec<String>,
    },
}

impl ExtractionContent {
    pub fn extraction_type(&self) -> ExtractionType {
        match self {
            ExtractionContent::Decision { .. } => ExtractionType::Decision,
            ExtractionContent::Pattern { .. } => ExtractionType::Pattern,
            ExtractionContent::Warning { .. } => ExtractionType::Warning,
            ExtractionContent::Methodology { .. } => ExtractionType::Methodology,
            ExtractionContent::Checklist { .. } => ExtractionType::Checklist,
            ExtractionContent::Persona { .. } => ExtractionType::Persona,
            ExtractionContent::Workflow { .. } => ExtractionType::Workflow,
        }
    }

    /// The field that best describes the record on its own.
    pub fn headline(&self) -> &str {
        match self {
            ExtractionContent::Decision { context, .. } => context,
            ExtractionContent::Pattern { problem, .. } => problem,
            ExtractionContent::Warning { pitfall, .. } => pitfall,
            ExtractionContent::Methodology { goal, .. } => goal,
            ExtractionContent::Checklist { purpose, .. } => purpose,
            ExtractionContent::Persona { role, .. } => role,
            ExtractionContent::Workflow { trigger, .. } => trigger,
        }
    }

    /// Check that the fields a record cannot do without are present.
    pub fn validate(&self) -> Result<()> {
        let missing = |field: &'static str| {
            Err(Error::MissingField {
                extraction_type: self.extraction_type(),
                field,
            })
        };

        if self.headline().trim().is_empty() {
            return missing(match self.extraction_type() {
                ExtractionType::Decision => "context",
                ExtractionType::Pattern => "problem",
                ExtractionType::Warning => "pitfall",
                ExtractionType::Methodology => "goal",
                ExtractionType::Checklist => "purpose",
                ExtractionType::Persona => "role",
                ExtractionType::Workflow => "trigger",
            });
        }

        match self {
            ExtractionContent::Decision { recommendation, .. } if recommendation.trim().is_empty() => {
                missing("recommendation")
            }
            ExtractionContent::Pattern { solution, .. } if solution.trim().is_empty() => {
                missing("solution")
            }
            ExtractionContent::Warning { mitigation, .. } if mitigation.trim().is_empty() => {
                missing("mitigation")
            }
            ExtractionContent::Methodology { steps, .. } | ExtractionContent::Workflow { steps, .. }
                if steps.iter().all(|s| s.trim().is_empty()) =>
            {
                missing("steps")
            }
            ExtractionContent::Checklist { items, .. } if items.iter().all(|s| s.trim().is_empty()) => {
                missing("items")
            }
            _ => Ok(()),
        }
    }

    /// All text fields joined, for full-text indexing and embeddings.
    pub fn search_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        match self {
            ExtractionContent::Decision { context, options, recommendation, rationale } => {
                parts.push(context);
                parts.extend(options.iter().map(String::as_str));
                parts.push(recommendation);
                parts.push(rationale);
            }
            ExtractionContent::Pattern { problem, solution, applicability, consequences } => {
                parts.extend([
                    problem.as_str(),
                    solution.as_str(),
                    applicability.as_str(),
                    consequences.as_str(),
                ]);
            }
            ExtractionContent::Warning { pitfall, symptoms, mitigation, .. } => {
                parts.push(pitfall);
                parts.extend(symptoms.iter().map(String::as_str));
                parts.push(mitigation);
            }
            ExtractionContent::Methodology { goal, steps, outcomes } => {
                parts.push(goal);
                parts.extend(steps.iter().map(String::as_str));
                parts.push(outcomes);
            }
            ExtractionContent::Checklist { purpose, items } => {
                parts.push(purpose);
                parts.extend(items.iter().map(String::as_str));
            }
            ExtractionContent::Persona { role, responsibilities, expertise } => {
                parts.push(role);
                parts.extend(responsibilities.iter().map(String::as_str));
                parts.extend(expertise.iter().map(String::as_str));
            }
            ExtractionContent::Workflow { trigger, steps, outputs } => {
                parts.push(trigger);
                parts.extend(steps.iter().map(String::as_str));
                parts.extend(outputs.iter().map(String::as_str));
            }
        }

        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// An extraction produced by the extractor, before it is bound to a chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionDraft {
    pub title: String,
    pub topics: Vec<String>,
    pub confidence: f32,
    pub content: ExtractionContent,
}

/// A typed structured record derived from a chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub id: ExtractionId,
    pub source_id: SourceId,
    pub chunk_id: ChunkId,
    pub title: String,
    pub topics: Vec<String>,
    pub confidence: f32,
    pub content: ExtractionContent,
    pub created_at: DateTime<Utc>,
}

impl Extraction {
    /// Bind a draft to the chunk it came from.
    ///
    /// The source is taken from the chunk, so an extraction can only ever
    /// point at the source that owns its chunk.
    pub fn from_draft(draft: ExtractionDraft, chunk: &Chunk) -> Self {
        Self {
            id: new_id(),
            source_id: chunk.source_id.clone(),
            chunk_id: chunk.id.clone(),
            title: draft.title,
            topics: normalize_topics(draft.topics),
            confidence: draft.confidence.clamp(0.0, 1.0),
            content: draft.content,
            created_at: Utc::now(),
        }
    }

    pub fn extraction_type(&self) -> ExtractionType {
        self.content.extraction_type()
    }

    /// Title, topics and content fields, for indexing.
    pub fn search_text(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.title,
            self.topics.join(" "),
            self.content.search_text()
        )
    }

    /// Text used when embedding this extraction.
    pub fn embedding_text(&self) -> String {
        format!("{}: {}", self.extraction_type(), self.search_text())
    }
}

/// Normalize topic tags: trimmed, lowercase, no duplicates, bounded count.
pub fn normalize_topics<I, S>(topics: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for topic in topics {
        let topic = topic
            .as_ref()
            .trim()
            .trim_start_matches('#')
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if topic.is_empty() || topic.len() > 50 || normalized.contains(&topic) {
            continue;
        }
        normalized.push(topic);
        if normalized.len() == MAX_TOPICS {
            break;
        }
    }
    normalized
}
