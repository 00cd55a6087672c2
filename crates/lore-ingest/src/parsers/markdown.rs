//! Markdown document parser.

use super::{title_from_path, DocumentParser, ParsedDocument, Section};
use crate::error::{IngestError, IngestResult};
use lore_core::ChunkPosition;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag};
use std::path::Path;

/// Parser for Markdown files.
///
/// `#` headings open a chapter and `##` headings open a section inside it.
/// Deeper headings stay in the text.
/// Code blocks keep their fences.
#[derive(Default)]
pub struct MarkdownParser;

struct Extracted {
    title: Option<String>,
    sections: Vec<Section>,
    links: Vec<String>,
}

impl MarkdownParser {
    /// Create a new markdown parser.
    pub fn new() -> Self {
        Self
    }

    fn flush(sections: &mut Vec<Section>, position: &ChunkPosition, text: &mut String) {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            sections.push(Section::new(position.clone(), trimmed));
        }
        text.clear();
    }

    fn extract(&self, markdown: &str) -> Extracted {
        let parser = Parser::new(markdown);
        let mut sections = Vec::new();
        let mut position = ChunkPosition::new();
        let mut text = String::new();
        let mut title: Option<String> = None;
        let mut links = Vec::new();
        let mut heading_level: Option<HeadingLevel> = None;
        let mut current_heading = String::new();

        for event in parser {
            match event {
                Event::Start(Tag::Heading(level, _, _)) => {
                    heading_level = Some(level);
                    current_heading.clear();
                }
                Event::End(Tag::Heading(_, _, _)) => {
                    let heading = current_heading.trim().to_string();
                    match heading_level {
                        Some(HeadingLevel::H1) => {
                            Self::flush(&mut sections, &position, &mut text);
                            if title.is_none() && !heading.is_empty() {
                                title = Some(heading.clone());
                            }
                            position = ChunkPosition::new().with_chapter(heading);
                        }
                        Some(HeadingLevel::H2) => {
                            Self::flush(&mut sections, &position, &mut text);
                            position.section = Some(heading);
                        }
                        _ => {
                            text.push_str(&heading);
                            text.push_str("\n\n");
                        }
                    }
                    heading_level = None;
                }
                Event::Start(Tag::CodeBlock(_)) => {
                    text.push_str("\n```\n");
                }
                Event::End(Tag::CodeBlock(_)) => {
                    text.push_str("```\n\n");
                }
                Event::Start(Tag::Link(_, dest, _)) => {
                    links.push(dest.to_string());
                }
                Event::End(Tag::Paragraph) => {
                    text.push_str("\n\n");
                }
                Event::End(Tag::List(_)) => {
                    text.push('\n');
                }
                Event::Start(Tag::Item) => {
                    text.push_str("- ");
                }
                Event::End(Tag::Item) => {
                    text.push('\n');
                }
                Event::Text(t) => {
                    if heading_level.is_some() {
                        current_heading.push_str(&t);
                    } else {
                        text.push_str(&t);
                    }
                }
                Event::Code(code) => {
                    let target = if heading_level.is_some() {
                        &mut current_heading
                    } else {
                        &mut text
                    };
                    target.push('`');
                    target.push_str(&code);
                    target.push('`');
                }
                Event::SoftBreak | Event::HardBreak => {
                    text.push('\n');
                }
                _ => {}
            }
        }

        Self::flush(&mut sections, &position, &mut text);

        Extracted {
            title,
            sections,
            links,
        }
    }
}

impl DocumentParser for MarkdownParser {
    fn parse(&self, path: &Path) -> IngestResult<ParsedDocument> {
        if !path.exists() {
            return Err(IngestError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let extracted = self.extract(&content);

        let metadata = serde_json::json!({
            "format": "markdown",
            "links": extracted.links,
            "original_length": content.len(),
        });

        let doc = ParsedDocument::new(extracted.sections).with_metadata(metadata);

        // Use filename as title if no h1 found
        match extracted.title.or_else(|| title_from_path(path)) {
            Some(t) => Ok(doc.with_title(t)),
            None => Ok(doc),
        }
    }

    fn extensions(&self) -> &[&str] {
        &["md", "markdown", "mdown", "mkd"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_markdown_positions() {
        let mut file = NamedTempFile::with_suffix(".md").unwrap();
        writeln!(
            file,
            r#"Preface text before any heading.

# Stability Patterns

Intro to the chapter with a [link](https://example.com).

## Timeouts

Always set timeouts on integration points.

### Detail

```rust
fn main() {{}}
```

## Circuit Breaker

- Closed
- Open

# Capacity

Plan for load.
"#
        )
        .unwrap();

        let parser = MarkdownParser::new();
        let doc = parser.parse(file.path()).unwrap();

        assert_eq!(doc.title.as_deref(), Some("Stability Patterns"));
        assert_eq!(doc.sections.len(), 5);

        assert!(doc.sections[0].position.is_empty());
        assert!(doc.sections[0].text.starts_with("Preface"));

        assert_eq!(doc.sections[1].position.chapter.as_deref(), Some("Stability Patterns"));
        assert_eq!(doc.sections[1].position.section, None);

        let timeouts = &doc.sections[2];
        assert_eq!(timeouts.position.section.as_deref(), Some("Timeouts"));
        assert!(timeouts.text.contains("Detail"));
        assert!(timeouts.text.contains("```\nfn main()"));

        assert_eq!(doc.sections[3].position.section.as_deref(), Some("Circuit Breaker"));
        assert!(doc.sections[3].text.contains("- Closed"));

        // A new chapter resets the section.
        assert_eq!(doc.sections[4].position.chapter.as_deref(), Some("Capacity"));
        assert_eq!(doc.sections[4].position.section, None);

        let links = doc.metadata["links"].as_array().unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0], "https://example.com");
    }

    #[test]
    fn test_no_title() {
        let mut file = NamedTempFile::with_suffix(".md").unwrap();
        writeln!(file, "Just some text without a heading.").unwrap();

        let parser = MarkdownParser::new();
        let doc = parser.parse(file.path()).unwrap();

        // Should use filename as title
        assert!(doc.title.is_some());
        assert_eq!(doc.sections.len(), 1);
    }

    #[test]
    fn test_empty_headings_produce_no_sections() {
        let parser = MarkdownParser::new();
        let extracted = parser.extract("# One\n\n## Two\n\n# Three\n");
        assert!(extracted.sections.is_empty());
        assert_eq!(extracted.title.as_deref(), Some("One"));
    }
}
