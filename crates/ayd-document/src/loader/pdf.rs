//! PDF documents.

use std::{
    fs,
    panic::{self, AssertUnwindSafe},
    path::Path,
};

use serde_json::Value as JsonValue;

use super::{DocumentLoader, base_metadata, non_empty};
use crate::{DocumentError, LoadedDocument};

/// Page separator emitted by the text extractor.
const FORM_FEED: char = '\u{c}';

/// Extracts the text layer of PDF files. Scanned PDFs without a text layer
/// fail with [`DocumentError::Empty`].
#[derive(Debug, Clone, Copy)]
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".pdf"]
    }

    fn load(&self, path: &Path) -> Result<Vec<LoadedDocument>, DocumentError> {
        let bytes = fs::read(path).map_err(|source| DocumentError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        // pdf-extract panics on some malformed files instead of returning an error.
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&bytes)
        }))
        .map_err(|_| DocumentError::parse(path, "PDF", "text extraction panicked"))?
        .map_err(|e| DocumentError::parse(path, "PDF", e))?;

        let pages = extracted
            .split(FORM_FEED)
            .filter(|p| !p.trim().is_empty())
            .count()
            .max(1);
        let text = non_empty(path, normalize_pdf_text(&extracted))?;

        let mut metadata = base_metadata(path, "pdf");
        metadata.insert("page_count".into(), JsonValue::from(pages));
        Ok(vec![LoadedDocument { text, metadata }])
    }
}

/// Replaces page breaks with blank lines and drops runs of more than one blank line.
fn normalize_pdf_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0;
    for line in raw.replace(FORM_FEED, "\n\n").lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_blank_runs() {
        let raw = "Title\n\n\n\nBody line   \n\u{c}Second page";
        assert_eq!(normalize_pdf_text(raw), "Title\n\nBody line\n\nSecond page");
    }

    #[test]
    fn test_invalid_pdf_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"this is not a pdf").unwrap();
        assert!(matches!(
            PdfLoader.load(&path),
            Err(DocumentError::Parse { format: "PDF", .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = PdfLoader.load(Path::new("/nonexistent/file.pdf"));
        assert!(matches!(result, Err(DocumentError::ReadFile { .. })));
    }
}
