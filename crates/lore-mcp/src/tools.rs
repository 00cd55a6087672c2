//! Tool definitions and execution.

use crate::error::{ToolError, ToolErrorCode};
use crate::protocol::ToolDefinition;
use crate::server::McpServer;
use lore_core::{ExtractionType, IngestionStatus, SourceType};
use lore_query::SearchRequest;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

const SEARCH_KNOWLEDGE: &str = "search_knowledge";
const GET_EXTRACTION: &str = "get_extraction";
const LIST_SOURCES: &str = "list_sources";
const COMPARE_SOURCES: &str = "compare_sources";

fn type_names() -> Vec<&'static str> {
    ExtractionType::ALL.iter().map(|t| t.as_str()).collect()
}

/// Every tool the server offers, in a stable order.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    let mut tools = vec![ToolDefinition {
        name: SEARCH_KNOWLEDGE.to_string(),
        description: "Search extracted knowledge (decisions, patterns, warnings, methodologies, \
                      checklists, personas, workflows) and source passages. Results cite the \
                      source title and chapter/section/page."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "What to look for"},
                "types": {
                    "type": "array",
                    "items": {"type": "string", "enum": type_names()},
                    "description": "Only these extraction types"
                },
                "source_id": {"type": "string", "description": "Only this source (id or unique prefix)"},
                "topic": {"type": "string", "description": "Only extractions tagged with this topic"},
                "limit": {"type": "integer", "minimum": 1, "maximum": 50},
                "include_chunks": {"type": "boolean", "description": "Also return raw passages (default true)"}
            },
            "required": ["query"]
        }),
    }];

    for extraction_type in ExtractionType::ALL {
        tools.push(ToolDefinition {
            name: format!("get_{}", extraction_type.plural()),
            description: format!(
                "List extracted {}, newest first, optionally filtered by topic or source.",
                extraction_type.plural()
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "topic": {"type": "string"},
                    "source_id": {"type": "string", "description": "Source id or unique prefix"},
                    "limit": {"type": "integer", "minimum": 1, "maximum": 50}
                }
            }),
        });
    }

    tools.push(ToolDefinition {
        name: GET_EXTRACTION.to_string(),
        description: "Fetch one extraction with all its fields, its source title and position.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "id": {"type": "string", "description": "Extraction id or unique prefix"}
            },
            "required": ["id"]
        }),
    });

    tools.push(ToolDefinition {
        name: LIST_SOURCES.to_string(),
        description: "List ingested books, papers and documents with chunk and extraction counts.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "status": {"type": "string", "enum": ["pending", "processing", "complete", "failed"]},
                "source_type": {
                    "type": "string",
                    "enum": SourceType::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>()
                }
            }
        }),
    });

    tools.push(ToolDefinition {
        name: COMPARE_SOURCES.to_string(),
        description: "Compare what 2 to 5 sources say about a topic, with per-type counts and shared topics."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "topic": {"type": "string"},
                "source_ids": {
                    "type": "array",
                    "items": {"type": "string"},
                    "minItems": 2,
                    "maxItems": 5
                }
            },
            "required": ["topic", "source_ids"]
        }),
    });

    tools
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    types: Vec<String>,
    source_id: Option<String>,
    topic: Option<String>,
    limit: Option<usize>,
    #[serde(default = "default_true")]
    include_chunks: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
struct ByTypeArgs {
    topic: Option<String>,
    source_id: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ExtractionArgs {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListSourcesArgs {
    status: Option<String>,
    source_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompareArgs {
    topic: String,
    source_ids: Vec<String>,
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments).map_err(|e| ToolError::invalid_arguments(e.to_string()))
}

fn parse_types(names: &[String]) -> Result<Vec<ExtractionType>, ToolError> {
    names
        .iter()
        .map(|name| {
            ExtractionType::from_str(name).ok_or_else(|| {
                ToolError::invalid_arguments(format!("unknown extraction type '{}'", name))
                    .with_hint(format!("Valid types: {}", type_names().join(", ")))
            })
        })
        .collect()
}

/// The type behind a `get_<plural>` tool name.
fn type_tool(name: &str) -> Option<ExtractionType> {
    let plural = name.strip_prefix("get_")?;
    ExtractionType::ALL.into_iter().find(|t| t.plural() == plural)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value)
        .map_err(|e| ToolError::new(ToolErrorCode::StoreUnavailable, format!("could not encode result: {}", e)))
}

impl McpServer {
    /// Run one tool and return its JSON payload.
    pub(crate) async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        debug!("Calling tool {}", name);

        if let Some(extraction_type) = type_tool(name) {
            let args: ByTypeArgs = parse_args(arguments)?;
            let results = self.query.get_by_type(
                extraction_type,
                args.topic.as_deref(),
                args.source_id.as_deref(),
                args.limit,
            )?;
            return Ok(json!({
                "type": extraction_type,
                "count": results.len(),
                "results": to_json(&results)?,
            }));
        }

        match name {
            SEARCH_KNOWLEDGE => self.search_knowledge(parse_args(arguments)?).await,
            GET_EXTRACTION => {
                let args: ExtractionArgs = parse_args(arguments)?;
                to_json(&self.query.get_extraction(&args.id)?)
            }
            LIST_SOURCES => {
                let args: ListSourcesArgs = parse_args(arguments)?;
                let status = args
                    .status
                    .as_deref()
                    .map(|s| {
                        IngestionStatus::from_str(s)
                            .ok_or_else(|| ToolError::invalid_arguments(format!("unknown status '{}'", s)))
                    })
                    .transpose()?;
                let source_type = args
                    .source_type
                    .as_deref()
                    .map(|s| {
                        SourceType::from_str(s)
                            .ok_or_else(|| ToolError::invalid_arguments(format!("unknown source type '{}'", s)))
                    })
                    .transpose()?;

                let sources = self.query.list_sources(status, source_type)?;
                Ok(json!({
                    "count": sources.len(),
                    "sources": to_json(&sources)?,
                }))
            }
            COMPARE_SOURCES => {
                let args: CompareArgs = parse_args(arguments)?;
                to_json(&self.query.compare_sources(&args.topic, &args.source_ids)?)
            }
            _ => Err(ToolError::new(
                ToolErrorCode::UnknownTool,
                format!("unknown tool '{}'", name),
            )),
        }
    }

    async fn search_knowledge(&self, args: SearchArgs) -> Result<Value, ToolError> {
        let mut request = SearchRequest::new(args.query)
            .with_types(parse_types(&args.types)?)
            .include_chunks(args.include_chunks);
        request.source_id = args.source_id;
        request.topic = args.topic;
        request.limit = args.limit;

        if request.query.trim().is_empty() {
            return Err(ToolError::invalid_arguments("query must not be empty"));
        }

        let mut notice = None;
        let vector = match &self.embedder {
            Some(embedder) => match embedder.embed(&request.query).await {
                Ok(vector) => Some(vector),
                Err(e) => {
                    warn!("Query embedding failed, using full-text search: {}", e);
                    notice = Some(format!("semantic search unavailable ({}); results are full-text only", e));
                    None
                }
            },
            None => None,
        };

        let hits = self.query.search(&request, vector.as_deref())?;
        let mut payload = json!({
            "query": request.query,
            "mode": if vector.is_some() { "hybrid" } else { "fulltext" },
            "count": hits.len(),
            "results": to_json(&hits)?,
        });
        if let Some(notice) = notice {
            payload["notice"] = Value::String(notice);
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definitions() {
        let tools = tool_definitions();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), 11);
        assert_eq!(names[0], "search_knowledge");
        for expected in [
            "get_decisions",
            "get_patterns",
            "get_warnings",
            "get_methodologies",
            "get_checklists",
            "get_personas",
            "get_workflows",
            "get_extraction",
            "list_sources",
            "compare_sources",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
        assert!(tools.iter().all(|t| t.input_schema["type"] == "object"));
    }

    #[test]
    fn test_type_tool_names() {
        assert_eq!(type_tool("get_methodologies"), Some(ExtractionType::Methodology));
        assert_eq!(type_tool("get_warnings"), Some(ExtractionType::Warning));
        assert_eq!(type_tool("get_warning"), None);
        assert_eq!(type_tool("get_extraction"), None);
    }

    #[test]
    fn test_parse_types() {
        let types = parse_types(&["Decision".to_string(), "warnings".to_string()]).unwrap();
        assert_eq!(types, vec![ExtractionType::Decision, ExtractionType::Warning]);

        let err = parse_types(&["recipe".to_string()]).unwrap_err();
        assert_eq!(err.code, ToolErrorCode::InvalidArguments);
        assert!(err.hint.contains("decision"));
    }

    #[test]
    fn test_parse_args_accepts_null() {
        let args: ByTypeArgs = parse_args(Value::Null).unwrap();
        assert!(args.topic.is_none());
        assert!(parse_args::<ExtractionArgs>(json!({"id": 5})).is_err());
    }
}
