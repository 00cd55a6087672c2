//! Section-aware content chunking.
//!
//! Splits each section of a parsed document on paragraph, then sentence,
//! then hard character boundaries. A chunk never spans two sections, so every
//! chunk carries exactly the position of the section it came from.

use crate::parsers::ParsedDocument;
use lore_core::{Chunk, SourceId};

/// Configuration for chunking.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Target size of each chunk in characters.
    pub chunk_size: usize,
    /// Number of characters to overlap between chunks of the same section.
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkConfig {
    /// Create config from ingestion settings.
    pub fn from_ingestion_config(config: &lore_config::IngestionConfig) -> Self {
        Self {
            // Convert token-based config to character-based (rough estimate: 4 chars per token)
            chunk_size: config.chunk_size * 4,
            chunk_overlap: config.chunk_overlap * 4,
        }
    }
}

/// Content chunker for splitting documents.
pub struct Chunker {
    config: ChunkConfig,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl Chunker {
    /// Create a new chunker with the given configuration.
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// Create a chunker with default configuration.
    pub fn default_chunker() -> Self {
        Self::new(ChunkConfig::default())
    }

    /// Split a parsed document into chunks with contiguous indices from 0.
    pub fn chunk_document(&self, source_id: &SourceId, document: &ParsedDocument) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for section in &document.sections {
            for piece in self.split_text(&section.text) {
                let index = chunks.len() as i32;
                chunks.push(
                    Chunk::new(source_id.clone(), index, piece)
                        .with_position(section.position.clone()),
                );
            }
        }

        chunks
    }

    /// Split text into pieces, preferring paragraph and sentence boundaries.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return vec![];
        }

        // If it fits in one chunk, return it
        if char_len(trimmed) <= self.config.chunk_size {
            return vec![trimmed.to_string()];
        }

        let mut pieces = Vec::new();
        let mut current = String::new();

        for para in trimmed.split("\n\n") {
            let para = para.trim();
            if para.is_empty() {
                continue;
            }

            if char_len(para) <= self.config.chunk_size {
                self.append(&mut pieces, &mut current, para, "\n\n");
                continue;
            }

            // Long paragraph: sentences, and hard splits for sentences that are still too long
            for sentence in split_sentences(para) {
                if char_len(sentence) <= self.config.chunk_size {
                    self.append(&mut pieces, &mut current, sentence, " ");
                } else {
                    for part in self.force_split_by_chars(sentence) {
                        self.append(&mut pieces, &mut current, &part, " ");
                    }
                }
            }
        }

        let tail = current.trim();
        if !tail.is_empty() {
            pieces.push(tail.to_string());
        }

        pieces
    }

    /// Add `unit` to the chunk being built, closing it first if it would overflow.
    ///
    /// `unit` is at most `chunk_size` characters, so no chunk exceeds `chunk_size`.
    fn append(&self, pieces: &mut Vec<String>, current: &mut String, unit: &str, separator: &str) {
        let current_len = char_len(current);
        let unit_len = char_len(unit);
        if current_len > 0 && current_len + separator.len() + unit_len > self.config.chunk_size {
            pieces.push(current.trim().to_string());
            // Carried overlap must leave room for the unit
            let room = self.config.chunk_size.saturating_sub(separator.len() + unit_len);
            *current = overlap_tail(current, self.config.chunk_overlap.min(room));
        }

        if !current.is_empty() {
            current.push_str(separator);
        }
        current.push_str(unit);
    }

    /// Force split text by character limit (for content without natural breaks).
    fn force_split_by_chars(&self, text: &str) -> Vec<String> {
        let step = self
            .config
            .chunk_size
            .saturating_sub(self.config.chunk_overlap)
            .max(1);
        let chars: Vec<char> = text.chars().collect();
        chars.chunks(step).map(|c| c.iter().collect()).collect()
    }
}

/// The last `len` characters of a closed chunk, carried into the next one.
fn overlap_tail(chunk: &str, len: usize) -> String {
    if len == 0 {
        return String::new();
    }
    let chars: Vec<char> = chunk.trim().chars().collect();
    let skip = chars.len().saturating_sub(len);
    chars[skip..].iter().collect::<String>().trim_start().to_string()
}

/// Split text into sentences.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if c == '.' || c == '!' || c == '?' {
            // Check if next char is whitespace or end
            let next_idx = i + c.len_utf8();
            let at_boundary = text[next_idx..]
                .chars()
                .next()
                .map(char::is_whitespace)
                .unwrap_or(true);

            if at_boundary {
                let sentence = text[start..next_idx].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = next_idx;
            }
        }
    }

    // Add remaining text
    let remaining = text[start..].trim();
    if !remaining.is_empty() {
        sentences.push(remaining);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::Section;
    use lore_core::ChunkPosition;

    fn small_config() -> ChunkConfig {
        ChunkConfig {
            chunk_size: 100,
            chunk_overlap: 20,
        }
    }

    #[test]
    fn test_small_text_single_piece() {
        let chunker = Chunker::default_chunker();
        let pieces = chunker.split_text("This is a small piece of text.");
        assert_eq!(pieces, vec!["This is a small piece of text."]);
    }

    #[test]
    fn test_empty_text() {
        let chunker = Chunker::default_chunker();
        assert!(chunker.split_text("").is_empty());
        assert!(chunker.split_text("   \n\n  ").is_empty());
    }

    #[test]
    fn test_large_text_multiple_pieces() {
        let chunker = Chunker::new(small_config());

        let text = "This is sentence one. This is sentence two. This is sentence three. \
                    This is sentence four. This is sentence five. This is sentence six. \
                    This is sentence seven. This is sentence eight. This is sentence nine.";

        let pieces = chunker.split_text(text);
        assert!(pieces.len() > 1, "Should create multiple pieces, got {}", pieces.len());

        for piece in &pieces {
            assert!(!piece.is_empty());
            assert!(char_len(piece) <= 100, "piece too long: {}", char_len(piece));
        }
        // Nothing is lost.
        assert!(pieces.last().unwrap().contains("sentence nine."));
        assert!(pieces.iter().any(|p| p.contains("sentence five.")));
    }

    #[test]
    fn test_text_without_breaks_is_force_split() {
        let chunker = Chunker::new(small_config());
        let text = "x".repeat(450);

        let pieces = chunker.split_text(&text);
        assert!(pieces.len() >= 5);
        for piece in &pieces {
            assert!(char_len(piece) <= 100);
        }
    }

    #[test]
    fn test_overlap_never_pushes_past_chunk_size() {
        let chunker = Chunker::new(small_config());
        // Paragraphs of 95 characters leave room for almost no overlap
        let para = format!("{}.", "a".repeat(94));
        let text = vec![para.as_str(); 4].join("\n\n");

        let pieces = chunker.split_text(&text);
        assert_eq!(pieces.len(), 4);
        for piece in &pieces {
            assert!(char_len(piece) <= 100, "piece too long: {}", char_len(piece));
        }
        // The little room left still carries some overlap
        assert!(pieces[1].starts_with("aa."));
    }

    #[test]
    fn test_overlap_carries_context() {
        let chunker = Chunker::new(small_config());
        let text = "Alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu. \
                    Nu xi omicron pi rho sigma tau upsilon phi chi psi omega end.";

        let pieces = chunker.split_text(text);
        assert_eq!(pieces.len(), 2);
        assert!(pieces[1].contains("lambda mu."));
        assert!(pieces[1].ends_with("omega end."));
        assert!(char_len(&pieces[1]) <= 100);
    }

    #[test]
    fn test_utf8_text() {
        let chunker = Chunker::new(ChunkConfig {
            chunk_size: 50,
            chunk_overlap: 10,
        });

        // Multi-byte characters must never be cut in half
        let text = "Hello ─── World! This has unicode: 日本語 and more ─ content here. ".repeat(4);
        let pieces = chunker.split_text(&text);
        assert!(pieces.len() > 1);
    }

    #[test]
    fn test_chunks_never_span_sections() {
        let chunker = Chunker::new(small_config());
        let long = "Paragraph sentence that goes on for a while. ".repeat(6);
        let doc = ParsedDocument::new(vec![
            Section::new(ChunkPosition::new().with_chapter("One"), long.clone()),
            Section::new(
                ChunkPosition::new().with_chapter("One").with_section("Short"),
                "Short section.",
            ),
            Section::new(ChunkPosition::new().with_chapter("Two").with_page(3), long),
        ]);

        let chunks = chunker.chunk_document(&"source-1".to_string(), &doc);
        assert!(chunks.len() > 3);

        // Indices are contiguous from zero
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i as i32);
            assert_eq!(chunk.source_id, "source-1");
        }

        let short: Vec<_> = chunks
            .iter()
            .filter(|c| c.position.section.as_deref() == Some("Short"))
            .collect();
        assert_eq!(short.len(), 1);
        assert_eq!(short[0].content, "Short section.");

        assert!(chunks
            .iter()
            .filter(|c| c.position.chapter.as_deref() == Some("Two"))
            .all(|c| c.position.page == Some(3) && !c.content.contains("Short section")));
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("One. Two! Three? v1.2 is fine. Tail");
        assert_eq!(sentences, vec!["One.", "Two!", "Three?", "v1.2 is fine.", "Tail"]);
    }

    #[test]
    fn test_from_ingestion_config() {
        let config = ChunkConfig::from_ingestion_config(&lore_config::IngestionConfig::default());
        assert_eq!(config.chunk_size, 2000);
        assert_eq!(config.chunk_overlap, 200);
    }
}
