//! YAML frontmatter parsing for markdown documents.
//!
//! Frontmatter is optional metadata at the start of a markdown file, delimited by `---`.
//! Recognised fields end up in the document metadata; the block itself is not indexed.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::Metadata;

/// Parsed frontmatter from a markdown document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Frontmatter {
    /// Document title.
    pub title: Option<String>,
    /// Document tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Author name.
    pub author: Option<String>,
    /// Short summary.
    pub description: Option<String>,
}

impl Frontmatter {
    /// Copies the populated fields into `metadata`.
    pub fn apply_to(&self, metadata: &mut Metadata) {
        if let Some(title) = &self.title {
            metadata.insert("title".into(), JsonValue::from(title.as_str()));
        }
        if !self.tags.is_empty() {
            metadata.insert("tags".into(), JsonValue::from(self.tags.clone()));
        }
        if let Some(author) = &self.author {
            metadata.insert("author".into(), JsonValue::from(author.as_str()));
        }
        if let Some(description) = &self.description {
            metadata.insert("description".into(), JsonValue::from(description.as_str()));
        }
    }
}

/// Parses YAML frontmatter from markdown content.
///
/// Returns the parsed frontmatter and the body that follows it. Content without a
/// well-formed block (no opening `---`, no closing `---`, or invalid YAML) comes back
/// unchanged with `None`.
pub fn parse_frontmatter(content: &str) -> (Option<Frontmatter>, &str) {
    let content = content.trim_start_matches('\u{feff}');
    let Some(after_opening) = strip_line(content, "---") else {
        return (None, content);
    };

    let mut offset = 0;
    for line in after_opening.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            let yaml = &after_opening[..offset];
            let body = after_opening[offset + line.len()..].trim_start_matches(['\r', '\n']);
            return match parse_block(yaml) {
                Some(fm) => (Some(fm), body),
                None => (None, content),
            };
        }
        offset += line.len();
    }

    (None, content)
}

/// Parses the YAML between the delimiters. An empty block is valid.
fn parse_block(yaml: &str) -> Option<Frontmatter> {
    if yaml.trim().is_empty() {
        return Some(Frontmatter::default());
    }
    serde_yaml::from_str(yaml).ok()
}

/// Strips `marker` when it forms the entire first line of `content`.
fn strip_line<'a>(content: &'a str, marker: &str) -> Option<&'a str> {
    let rest = content.strip_prefix(marker)?;
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}
