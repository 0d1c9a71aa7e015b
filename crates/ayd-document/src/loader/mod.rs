//! Document loaders.
//!
//! Each loader turns one file format into plain text plus metadata. Loaders are
//! stateless unit structs registered in a static table and looked up by file
//! extension.

mod code;
mod docx;
mod html;
mod pdf;
mod tabular;
mod text;

use std::{fs, path::Path};

pub use code::{CodeLoader, detect_language};
pub use docx::DocxLoader;
pub use html::HtmlLoader;
pub use pdf::PdfLoader;
use serde_json::Value as JsonValue;
pub use tabular::CsvLoader;
pub use text::TextLoader;
use tracing::debug;

use crate::{DocumentError, LoadedDocument, Metadata};

/// Converts one file format into [`LoadedDocument`]s.
pub trait DocumentLoader: Sync {
    /// Short loader name for logs.
    fn name(&self) -> &'static str;

    /// Extensions handled, lowercase with a leading dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Loads the file at `path`.
    fn load(&self, path: &Path) -> Result<Vec<LoadedDocument>, DocumentError>;

    /// Returns true if this loader handles `extension` (with or without the dot).
    fn can_handle(&self, extension: &str) -> bool {
        let ext = normalize_extension(extension);
        self.extensions().contains(&ext.as_str())
    }
}

/// All registered loaders.
static LOADERS: &[&dyn DocumentLoader] = &[
    &TextLoader,
    &CodeLoader,
    &PdfLoader,
    &DocxLoader,
    &HtmlLoader,
    &CsvLoader,
];

/// Returns the loader for an extension such as `.pdf` or `PDF`.
pub fn get_document_loader(extension: &str) -> Option<&'static dyn DocumentLoader> {
    LOADERS
        .iter()
        .copied()
        .find(|loader| loader.can_handle(extension))
}

/// Returns the loader for a file path, based on its extension.
pub fn loader_for_path(path: &Path) -> Option<&'static dyn DocumentLoader> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(get_document_loader)
}

/// Returns every supported extension, sorted.
pub fn get_supported_extensions() -> Vec<&'static str> {
    let mut extensions: Vec<&'static str> = LOADERS
        .iter()
        .flat_map(|loader| loader.extensions().iter().copied())
        .collect();
    extensions.sort_unstable();
    extensions.dedup();
    extensions
}

/// Loads a file with the loader matching its extension.
pub fn load_file(path: &Path) -> Result<Vec<LoadedDocument>, DocumentError> {
    let loader = loader_for_path(path).ok_or_else(|| DocumentError::UnsupportedFileType {
        path: path.to_path_buf(),
    })?;
    debug!(loader = loader.name(), path = %path.display(), "loading document");
    loader.load(path)
}

/// Lowercases an extension and ensures it starts with a dot.
fn normalize_extension(extension: &str) -> String {
    let lower = extension.trim().to_ascii_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

/// Metadata every loader starts from.
fn base_metadata(path: &Path, source_type: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("source_type".into(), JsonValue::from(source_type));
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(normalize_extension)
        .unwrap_or_default();
    metadata.insert("file_extension".into(), JsonValue::from(extension));
    metadata
}

/// Reads a file as text, replacing invalid UTF-8.
///
/// Fails with [`DocumentError::Empty`] when nothing but whitespace or NUL bytes remains.
fn read_text(path: &Path) -> Result<String, DocumentError> {
    let bytes = fs::read(path).map_err(|source| DocumentError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    non_empty(path, text)
}

/// Rejects text that is blank once NUL bytes are ignored.
fn non_empty(path: &Path, text: String) -> Result<String, DocumentError> {
    if text.chars().all(|c| c.is_whitespace() || c == '\0') {
        return Err(DocumentError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(text)
}
