//! Full-text query helpers.

/// Turn free text into an FTS5 query that cannot fail to parse.
///
/// Each alphanumeric token is quoted and the tokens are OR-ed together, so
/// punctuation and FTS operators typed by a user are treated as plain text.
/// Returns `None` when the text has no searchable tokens.
pub fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t.to_lowercase()))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

/// Map a BM25 rank (lower is better, usually negative) into `(0, 1)`.
pub(crate) fn bm25_score(rank: f64) -> f32 {
    (1.0 / (1.0 + rank.exp())) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fts_query_quotes_terms() {
        assert_eq!(
            fts_query("Cache invalidation"),
            Some("\"cache\" OR \"invalidation\"".to_string())
        );
    }

    #[test]
    fn test_fts_query_strips_operators() {
        assert_eq!(
            fts_query("NEAR(\"a\" - b*) OR :"),
            Some("\"near\" OR \"a\" OR \"b\" OR \"or\"".to_string())
        );
        assert_eq!(fts_query("  -- ** "), None);
        assert_eq!(fts_query(""), None);
    }

    #[test]
    fn test_bm25_score_preserves_order() {
        let better = bm25_score(-4.0);
        let worse = bm25_score(-0.5);
        assert!(better > worse);
        assert!(better < 1.0 && worse > 0.0);
    }
}
