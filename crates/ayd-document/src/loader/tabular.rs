//! Delimited tabular data (`.csv`, `.tsv`).

use std::path::Path;

use csv::ReaderBuilder;
use serde_json::Value as JsonValue;

use super::{DocumentLoader, base_metadata, non_empty};
use crate::{DocumentError, LoadedDocument};

/// Renders each row as `column: value` pairs so rows embed as self-describing text.
#[derive(Debug, Clone, Copy)]
pub struct CsvLoader;

impl DocumentLoader for CsvLoader {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".csv", ".tsv"]
    }

    fn load(&self, path: &Path) -> Result<Vec<LoadedDocument>, DocumentError> {
        let delimiter = if path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("tsv"))
        {
            b'\t'
        } else {
            b','
        };
        let parse_err = |e: csv::Error| DocumentError::parse(path, "CSV", e);

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(path)
            .map_err(parse_err)?;
        let headers: Vec<String> = reader
            .headers()
            .map_err(parse_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut lines = Vec::new();
        for record in reader.records() {
            let record = record.map_err(parse_err)?;
            let fields: Vec<String> = record
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.trim().is_empty())
                .map(|(i, v)| match headers.get(i).filter(|h| !h.is_empty()) {
                    Some(header) => format!("{header}: {}", v.trim()),
                    None => v.trim().to_string(),
                })
                .collect();
            if !fields.is_empty() {
                lines.push(fields.join(", "));
            }
        }

        let row_count = lines.len();
        let text = non_empty(path, lines.join("\n"))?;
        let mut metadata = base_metadata(path, "structured");
        metadata.insert("row_count".into(), JsonValue::from(row_count));
        metadata.insert("columns".into(), JsonValue::from(headers));
        Ok(vec![LoadedDocument { text, metadata }])
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn load(name: &str, content: &str) -> Result<LoadedDocument, DocumentError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        CsvLoader.load(&path).map(|mut docs| docs.remove(0))
    }

    #[test]
    fn test_rows_become_labelled_lines() {
        let doc = load("people.csv", "name,role\nAda,engineer\nGrace,admiral\n").unwrap();
        assert_eq!(doc.text, "name: Ada, role: engineer\nname: Grace, role: admiral");
        assert_eq!(doc.metadata["row_count"], 2);
        assert_eq!(doc.metadata["columns"], serde_json::json!(["name", "role"]));
        assert_eq!(doc.metadata["source_type"], "structured");
    }

    #[test]
    fn test_tsv_and_ragged_rows() {
        let doc = load("t.tsv", "a\tb\n1\t2\t3\n\t\n").unwrap();
        assert_eq!(doc.text, "a: 1, b: 2, 3");
        assert_eq!(doc.metadata["row_count"], 1);
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(matches!(
            load("h.csv", "a,b\n"),
            Err(DocumentError::Empty { .. })
        ));
    }
}
