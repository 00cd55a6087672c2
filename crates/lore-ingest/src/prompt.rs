//! Extraction prompts and tolerant parsing of the model's answer.

use lore_core::{ChunkPosition, ExtractionContent, ExtractionDraft, ExtractionType};
use serde_json::Value;
use tracing::warn;

const TITLE_FALLBACK_CHARS: usize = 80;

pub(crate) const SYSTEM_PROMPT: &str = "You turn passages from technical books and papers into \
structured, reusable knowledge. You answer with JSON only.";

pub(crate) fn build_extraction_prompt(
    source_title: &str,
    position: &ChunkPosition,
    chunk_text: &str,
    max_items: usize,
) -> String {
    format!(
        r#"Extract reusable knowledge from the passage below.

SOURCE: {source_title}
LOCATION: {position}

Record types and their fields:
- decision: context, options (list), recommendation, rationale
- pattern: problem, solution, applicability, consequences
- warning: pitfall, symptoms (list), mitigation, severity (low|medium|high)
- methodology: goal, steps (list), outcomes
- checklist: purpose, items (list)
- persona: role, responsibilities (list), expertise (list)
- workflow: trigger, steps (list), outputs (list)

Every record also has: type, title (short), topics (1-5 lowercase tags), confidence (0.0-1.0).

RULES:
- Only extract what the passage actually says; do not invent advice.
- Return at most {max_items} records. Return an empty list if nothing is worth keeping.
- Output ONLY a JSON object of the form {{"extractions": [ ... ]}}.

PASSAGE:
{chunk_text}

JSON OUTPUT:"#
    )
}

pub(crate) fn build_retry_prompt(invalid_json: &str, problem: &str) -> String {
    format!(
        r#"The following answer could not be used ({problem}):

{invalid_json}

Fix it. Output only a JSON object of the form {{"extractions": [ ... ]}} with no markdown, no code blocks and no explanations."#
    )
}

/// Strip code fences and any prose around the JSON payload.
fn json_payload(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string (e.g. `json`) on the fence line
        text = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
        text = text.trim_end().strip_suffix("```").unwrap_or(text).trim();
    }

    let start = text.find(['{', '[']);
    let end = text.rfind(['}', ']']);
    match (start, end) {
        (Some(s), Some(e)) if e >= s => &text[s..=e],
        _ => text,
    }
}

/// Parse the model's answer into drafts.
///
/// Returns `Err` with a short reason when the answer is not usable JSON at
/// all, so the caller can ask again. Individual records that are malformed
/// are dropped with a warning. At most `max_items` drafts are returned.
pub fn parse_extraction_response(raw: &str, max_items: usize) -> Result<Vec<ExtractionDraft>, String> {
    let value: Value =
        serde_json::from_str(json_payload(raw)).map_err(|e| format!("invalid JSON: {}", e))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("extractions") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None if map.contains_key("type") => vec![Value::Object(map)],
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err("\"extractions\" is not a list".to_string()),
        },
        _ => return Err("expected a JSON object or list".to_string()),
    };

    let drafts = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match parse_item(item) {
            Ok(draft) => Some(draft),
            Err(reason) => {
                warn!("Dropping extraction #{}: {}", i, reason);
                None
            }
        })
        .take(max_items)
        .collect();

    Ok(drafts)
}

fn parse_item(item: Value) -> Result<ExtractionDraft, String> {
    let Value::Object(mut map) = item else {
        return Err("not an object".to_string());
    };

    let type_name = map
        .get("type")
        .and_then(Value::as_str)
        .ok_or("missing type")?
        .to_string();
    let extraction_type =
        ExtractionType::from_str(&type_name).ok_or_else(|| format!("unknown type '{}'", type_name))?;

    let title = map
        .remove("title")
        .and_then(|v| v.as_str().map(|s| s.trim().to_string()))
        .unwrap_or_default();
    let topics = match map.remove("topics") {
        Some(Value::Array(values)) => values
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    let confidence = match map.remove("confidence") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.5),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.5),
        _ => 0.5,
    };

    // Some models nest the type-specific fields under "content"
    let mut fields = match map.remove("content") {
        Some(Value::Object(inner)) => inner,
        _ => map,
    };
    fields.insert("type".to_string(), Value::from(extraction_type.as_str()));
    if let Some(Value::String(severity)) = fields.get_mut("severity") {
        *severity = severity.trim().to_lowercase();
    }

    let content: ExtractionContent =
        serde_json::from_value(Value::Object(fields)).map_err(|e| e.to_string())?;
    content.validate().map_err(|e| e.to_string())?;

    let title = if title.is_empty() {
        content
            .headline()
            .trim()
            .chars()
            .take(TITLE_FALLBACK_CHARS)
            .collect()
    } else {
        title
    };

    Ok(ExtractionDraft {
        title,
        topics,
        confidence: confidence.clamp(0.0, 1.0) as f32,
        content,
    })
}
