//! Plain text, markdown, and text-based data formats.

use std::path::Path;

use serde_json::Value as JsonValue;

use super::{DocumentLoader, base_metadata, non_empty, read_text};
use crate::{DocumentError, LoadedDocument, frontmatter::parse_frontmatter, markdown};

/// Loads plain text files. Markdown frontmatter is lifted into metadata and valid
/// JSON is pretty-printed so keys and values split cleanly into chunks.
#[derive(Debug, Clone, Copy)]
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[
            ".txt", ".md", ".markdown", ".rst", ".json", ".yaml", ".yml", ".toml", ".xml",
            ".ini", ".cfg", ".log", ".tex",
        ]
    }

    fn load(&self, path: &Path) -> Result<Vec<LoadedDocument>, DocumentError> {
        let raw = read_text(path)?;
        let mut metadata = base_metadata(path, "text");
        let ext = metadata
            .get("file_extension")
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string();

        let text = match ext.as_str() {
            ".md" | ".markdown" => {
                let (frontmatter, body) = parse_frontmatter(&raw);
                if let Some(fm) = &frontmatter {
                    fm.apply_to(&mut metadata);
                }
                if !metadata.contains_key("title")
                    && let Some(title) = markdown::first_heading(body)
                {
                    metadata.insert("title".into(), JsonValue::from(title));
                }
                non_empty(path, body.to_string())?
            }
            ".json" => match serde_json::from_str::<JsonValue>(&raw) {
                Ok(value) => serde_json::to_string_pretty(&value).unwrap_or(raw),
                Err(_) => raw,
            },
            _ => raw,
        };

        metadata.insert("line_count".into(), JsonValue::from(text.lines().count()));
        Ok(vec![LoadedDocument { text, metadata }])
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn load(name: &str, content: &str) -> LoadedDocument {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        TextLoader.load(&path).unwrap().remove(0)
    }

    #[test]
    fn test_plain_text() {
        let doc = load("notes.txt", "first line\nsecond line\n");
        assert_eq!(doc.text, "first line\nsecond line\n");
        assert_eq!(doc.metadata["source_type"], "text");
        assert_eq!(doc.metadata["file_extension"], ".txt");
        assert_eq!(doc.metadata["line_count"], 2);
    }

    #[test]
    fn test_markdown_frontmatter() {
        let doc = load(
            "guide.md",
            "---\ntitle: Setup Guide\ntags: [install]\n---\n\n# Installing\n\nRun it.\n",
        );
        assert!(doc.text.starts_with("# Installing"));
        assert_eq!(doc.metadata["title"], "Setup Guide");
        assert_eq!(doc.metadata["tags"], serde_json::json!(["install"]));
    }

    #[test]
    fn test_markdown_title_from_heading() {
        let doc = load("readme.md", "# Project Atlas\n\nMaps things.\n");
        assert_eq!(doc.metadata["title"], "Project Atlas");
    }

    #[test]
    fn test_frontmatter_only_markdown_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stub.md");
        fs::write(&path, "---\ntitle: Placeholder\n---\n\n").unwrap();
        let err = TextLoader.load(&path).unwrap_err();
        assert!(matches!(err, DocumentError::Empty { .. }), "got {err:?}");
    }

    #[test]
    fn test_json_is_pretty_printed() {
        let doc = load("data.json", r#"{"name":"atlas","tags":["a","b"]}"#);
        assert!(doc.text.contains("\"name\": \"atlas\""));
        assert_eq!(doc.metadata["file_extension"], ".json");
    }

    #[test]
    fn test_invalid_json_kept_verbatim() {
        let doc = load("broken.json", "{not json");
        assert_eq!(doc.text, "{not json");
    }

    #[test]
    fn test_can_handle() {
        assert!(TextLoader.can_handle(".txt"));
        assert!(TextLoader.can_handle("md"));
        assert!(TextLoader.can_handle(".json"));
        assert!(!TextLoader.can_handle(".py"));
    }
}
