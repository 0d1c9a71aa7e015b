//! HTML pages.

use std::path::Path;

use scraper::{Html, Node};
use serde_json::Value as JsonValue;

use super::{DocumentLoader, base_metadata, non_empty, read_text};
use crate::{DocumentError, LoadedDocument};

/// Elements whose text is never visible.
const HIDDEN: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start a new line of text.
const BLOCKS: &[&str] = &[
    "p", "div", "br", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
    "header", "footer", "blockquote", "pre", "table", "ul", "ol", "dd", "dt",
];

/// Extracts the visible text and `<title>` of HTML pages.
#[derive(Debug, Clone, Copy)]
pub struct HtmlLoader;

impl DocumentLoader for HtmlLoader {
    fn name(&self) -> &'static str {
        "html"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".html", ".htm"]
    }

    fn load(&self, path: &Path) -> Result<Vec<LoadedDocument>, DocumentError> {
        let raw = read_text(path)?;
        let (title, text) = extract_text(&raw);
        let text = non_empty(path, text)?;

        let mut metadata = base_metadata(path, "html");
        if let Some(title) = title {
            metadata.insert("title".into(), JsonValue::from(title));
        }
        Ok(vec![LoadedDocument { text, metadata }])
    }
}

/// Returns the page title and the visible text, one block per line.
fn extract_text(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);
    let mut title = None;
    let mut raw = String::new();

    for node in document.root_element().descendants() {
        match node.value() {
            Node::Element(element) => {
                let name = element.name();
                if name == "title" && title.is_none() {
                    let text: String = node
                        .children()
                        .filter_map(|c| c.value().as_text().map(|t| t.to_string()))
                        .collect();
                    title = Some(collapse_whitespace(&text)).filter(|t| !t.is_empty());
                }
                if BLOCKS.contains(&name) {
                    raw.push('\n');
                }
            }
            Node::Text(text) => {
                let hidden = node.ancestors().any(|a| {
                    a.value()
                        .as_element()
                        .is_some_and(|e| HIDDEN.contains(&e.name()))
                });
                if !hidden {
                    raw.push_str(text);
                }
            }
            _ => {}
        }
    }

    let text = raw
        .lines()
        .map(collapse_whitespace)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (title, text)
}

/// Collapses runs of whitespace into single spaces and trims.
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title> Release   Notes </title><style>body { color: red; }</style></head>
<body>
  <h1>Version 2.0</h1>
  <p>Adds <b>hybrid</b> search.</p>
  <script>console.log("hidden");</script>
  <ul><li>Faster</li><li>Smaller</li></ul>
</body>
</html>"#;

    #[test]
    fn test_extract_text() {
        let (title, text) = extract_text(PAGE);
        assert_eq!(title.as_deref(), Some("Release Notes"));
        assert_eq!(text, "Version 2.0\nAdds hybrid search.\nFaster\nSmaller");
    }

    #[test]
    fn test_load_html_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.html");
        fs::write(&path, PAGE).unwrap();
        let doc = HtmlLoader.load(&path).unwrap().remove(0);
        assert_eq!(doc.metadata["title"], "Release Notes");
        assert_eq!(doc.metadata["source_type"], "html");
        assert!(!doc.text.contains("console.log"));
    }

    #[test]
    fn test_script_only_page_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.htm");
        fs::write(&path, "<html><body><script>x()</script></body></html>").unwrap();
        assert!(matches!(
            HtmlLoader.load(&path),
            Err(DocumentError::Empty { .. })
        ));
    }
}
