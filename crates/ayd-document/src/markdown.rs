//! Markdown structure analysis.
//!
//! Sections are cut at the first heading level that occurs at least twice, so a
//! document with a single `#` title and several `##` sections splits at `##`.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

/// A heading found in markdown source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// The heading level (h1-h6).
    pub level: HeadingLevel,
    /// Plain heading text.
    pub text: String,
    /// Byte offset where the heading starts.
    pub start: usize,
}

/// A contiguous region of a markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading that opens the section, `None` for the preamble.
    pub title: Option<String>,
    /// Parent headings joined with ` > `, ending with the section title.
    pub breadcrumb: String,
    /// Byte offset of the section start.
    pub start: usize,
    /// Byte offset one past the section end.
    pub end: usize,
}

/// Extracts all headings with their byte offsets.
pub fn extract_headings(content: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut current: Option<Heading> = None;

    for (event, range) in Parser::new(content).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some(Heading {
                    level,
                    text: String::new(),
                    start: range.start,
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(heading) = current.take() {
                    headings.push(heading);
                }
            }
            _ => {}
        }
    }

    headings
}

/// Returns the text of the first heading, if any.
pub fn first_heading(content: &str) -> Option<String> {
    extract_headings(content)
        .into_iter()
        .map(|h| h.text.trim().to_string())
        .find(|t| !t.is_empty())
}

/// Returns the first heading level with two or more headings.
pub fn determine_split_level(headings: &[Heading]) -> Option<HeadingLevel> {
    let mut counts = [0usize; 6];
    for heading in headings {
        counts[level_index(heading.level)] += 1;
    }
    counts.iter().position(|&c| c >= 2).and_then(index_level)
}

/// Splits markdown into sections at the adaptive heading level.
///
/// A document without a repeated heading level is one section. Content before
/// the first split heading becomes a preamble section only if it is not blank.
pub fn split_sections(content: &str) -> Vec<Section> {
    let headings = extract_headings(content);
    let Some(level) = determine_split_level(&headings) else {
        return vec![Section {
            title: None,
            breadcrumb: String::new(),
            start: 0,
            end: content.len(),
        }];
    };

    let split: Vec<&Heading> = headings.iter().filter(|h| h.level == level).collect();
    let mut sections = Vec::with_capacity(split.len() + 1);

    let first_start = split.first().map_or(content.len(), |h| h.start);
    if !content[..first_start].trim().is_empty() {
        sections.push(Section {
            title: None,
            breadcrumb: String::new(),
            start: 0,
            end: first_start,
        });
    }

    for (i, heading) in split.iter().enumerate() {
        let end = split.get(i + 1).map_or(content.len(), |h| h.start);
        sections.push(Section {
            title: Some(heading.text.clone()),
            breadcrumb: breadcrumb(&headings, heading, level),
            start: heading.start,
            end,
        });
    }

    sections
}

/// Builds the breadcrumb for `current` from the shallower headings before it.
fn breadcrumb(all: &[Heading], current: &Heading, level: HeadingLevel) -> String {
    let mut stack: Vec<&Heading> = Vec::new();
    for heading in all
        .iter()
        .take_while(|h| h.start < current.start)
        .filter(|h| h.level < level)
    {
        while stack.last().is_some_and(|p| p.level >= heading.level) {
            stack.pop();
        }
        stack.push(heading);
    }

    stack
        .iter()
        .map(|h| h.text.as_str())
        .chain([current.text.as_str()])
        .collect::<Vec<_>>()
        .join(" > ")
}

/// Converts a heading level to an array index (0-5).
fn level_index(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 0,
        HeadingLevel::H2 => 1,
        HeadingLevel::H3 => 2,
        HeadingLevel::H4 => 3,
        HeadingLevel::H5 => 4,
        HeadingLevel::H6 => 5,
    }
}

/// Converts an array index (0-5) to a heading level.
fn index_level(idx: usize) -> Option<HeadingLevel> {
    match idx {
        0 => Some(HeadingLevel::H1),
        1 => Some(HeadingLevel::H2),
        2 => Some(HeadingLevel::H3),
        3 => Some(HeadingLevel::H4),
        4 => Some(HeadingLevel::H5),
        5 => Some(HeadingLevel::H6),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_headings_with_code() {
        let headings = extract_headings("# The `Option` type\n\ntext\n\n## Next\n");
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].text, "The Option type");
        assert_eq!(headings[1].level, HeadingLevel::H2);
    }

    #[test]
    fn test_first_heading() {
        assert_eq!(first_heading("intro\n\n## Setup\n").as_deref(), Some("Setup"));
        assert_eq!(first_heading("no headings here"), None);
    }

    #[test]
    fn test_single_title_splits_at_h2() {
        let content = "# Guide\n\nintro\n\n## Install\n\nsteps\n\n## Use\n\nmore\n";
        let sections = split_sections(content);
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].title, None);
        assert_eq!(sections[1].title.as_deref(), Some("Install"));
        assert_eq!(sections[1].breadcrumb, "Guide > Install");
        assert!(content[sections[2].start..sections[2].end].contains("more"));
    }

    #[test]
    fn test_no_repeated_level_is_one_section() {
        let content = "# Only\n\ntext";
        let sections = split_sections(content);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].end, content.len());
    }

    #[test]
    fn test_blank_preamble_skipped() {
        let sections = split_sections("# A\n\none\n\n# B\n\ntwo\n");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].breadcrumb, "A");
    }

    #[test]
    fn test_sections_cover_document() {
        let content = "pre\n\n## A\n\na\n\n## B\n\nb";
        let sections = split_sections(content);
        assert_eq!(sections.first().unwrap().start, 0);
        assert_eq!(sections.last().unwrap().end, content.len());
        for pair in sections.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }
}
