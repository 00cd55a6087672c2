//! PDF document parser.

use super::{title_from_path, DocumentParser, ParsedDocument, Section};
use crate::error::{IngestError, IngestResult};
use lore_core::ChunkPosition;
use std::path::Path;
use tracing::debug;

/// Parser for PDF files.
///
/// Pages are separated by form feeds in the extracted text. A line that
/// starts with `Chapter <word>` opens a chapter, which then applies to every
/// following page until the next chapter line.
pub struct PdfParser;

impl PdfParser {
    /// Create a new PDF parser.
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for PdfParser {
    fn parse(&self, path: &Path) -> IngestResult<ParsedDocument> {
        if !path.exists() {
            return Err(IngestError::FileNotFound(path.to_path_buf()));
        }

        debug!("Parsing PDF: {:?}", path);

        let content = pdf_extract::extract_text(path).map_err(|e| IngestError::ParseError {
            path: path.to_path_buf(),
            message: format!("Failed to extract text from PDF: {}", e),
        })?;

        let (sections, page_count) = paginate(&content);
        debug!(
            "Extracted {} sections over {} pages from PDF",
            sections.len(),
            page_count
        );

        let metadata = serde_json::json!({
            "format": "pdf",
            "length": content.len(),
            "pages": page_count,
        });

        let doc = ParsedDocument::new(sections).with_metadata(metadata);
        match title_from_path(path) {
            Some(t) => Ok(doc.with_title(t)),
            None => Ok(doc),
        }
    }

    fn extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

/// Returns the chapter name if `line` opens a chapter.
fn chapter_heading(line: &str) -> Option<String> {
    let mut words = line.split_whitespace();
    let first = words.next()?;
    let second = words.next()?;

    if !first.eq_ignore_ascii_case("chapter") || !second.chars().any(|c| c.is_alphanumeric()) {
        return None;
    }

    let heading = line.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(heading.chars().take(80).collect())
}

/// Split extracted PDF text into positioned sections.
///
/// Returns the sections and the number of pages seen.
fn paginate(text: &str) -> (Vec<Section>, usize) {
    let mut sections = Vec::new();
    let mut chapter: Option<String> = None;
    let pages: Vec<&str> = text.split('\x0C').collect();

    for (i, page) in pages.iter().enumerate() {
        let page_number = (i + 1) as u32;
        let mut current = String::new();

        for line in page.lines() {
            let line = line.trim();

            if let Some(heading) = chapter_heading(line) {
                push_section(&mut sections, &chapter, page_number, &mut current);
                chapter = Some(heading);
                continue;
            }

            // Collapse runs of blank lines into one paragraph break
            if line.is_empty() {
                if !current.is_empty() && !current.ends_with("\n\n") {
                    current.push_str("\n\n");
                }
                continue;
            }

            if !current.is_empty() && !current.ends_with('\n') {
                current.push('\n');
            }
            current.push_str(line);
        }

        push_section(&mut sections, &chapter, page_number, &mut current);
    }

    (sections, pages.len())
}

fn push_section(
    sections: &mut Vec<Section>,
    chapter: &Option<String>,
    page: u32,
    text: &mut String,
) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        let mut position = ChunkPosition::new().with_page(page);
        position.chapter = chapter.clone();
        sections.push(Section::new(position, trimmed));
    }
    text.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_parser_extensions() {
        let parser = PdfParser::new();
        assert!(parser.supports("pdf"));
        assert!(parser.supports("PDF"));
        assert!(!parser.supports("txt"));
    }

    #[test]
    fn test_chapter_heading() {
        assert_eq!(chapter_heading("Chapter 3  Caching"), Some("Chapter 3 Caching".to_string()));
        assert_eq!(chapter_heading("CHAPTER ONE"), Some("CHAPTER ONE".to_string()));
        assert_eq!(chapter_heading("Chapter"), None);
        assert_eq!(chapter_heading("This chapter covers"), None);
        assert_eq!(chapter_heading("Chapter -"), None);
    }

    #[test]
    fn test_paginate_pages_and_chapters() {
        let text = "Front matter\n\x0CChapter 1 Basics\n  Intro text  \n\n\n\nMore text\x0CStill chapter one\nChapter 2 Depth\nDeep text\x0C\n\n";
        let (sections, pages) = paginate(text);

        assert_eq!(pages, 4);
        assert_eq!(sections.len(), 4);

        assert_eq!(sections[0].position.page, Some(1));
        assert_eq!(sections[0].position.chapter, None);

        assert_eq!(sections[1].position.page, Some(2));
        assert_eq!(sections[1].position.chapter.as_deref(), Some("Chapter 1 Basics"));
        assert_eq!(sections[1].text, "Intro text\n\nMore text");

        // Chapter carries over to the next page.
        assert_eq!(sections[2].position.page, Some(3));
        assert_eq!(sections[2].position.chapter.as_deref(), Some("Chapter 1 Basics"));
        assert_eq!(sections[2].text, "Still chapter one");

        assert_eq!(sections[3].position.page, Some(3));
        assert_eq!(sections[3].position.chapter.as_deref(), Some("Chapter 2 Depth"));
    }

    #[test]
    fn test_paginate_without_form_feeds() {
        let (sections, pages) = paginate("Only one page of text");
        assert_eq!(pages, 1);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].position.page, Some(1));
    }
}
