//! Document loading and chunking for AskYourDocs.
//!
//! This crate turns files on disk into text ready for embedding:
//! - format loaders for text, code, PDF, DOCX, HTML and CSV
//! - YAML frontmatter extraction (title, tags)
//! - sentence, recursive, fixed-window and markdown-heading chunking

#![warn(missing_docs)]

mod chunker;
mod error;
mod frontmatter;
mod loader;
mod markdown;

use std::collections::BTreeMap;

pub use chunker::{Chunker, TextChunk};
pub use error::DocumentError;
pub use frontmatter::{Frontmatter, parse_frontmatter};
pub use loader::{
    CodeLoader, CsvLoader, DocumentLoader, DocxLoader, HtmlLoader, PdfLoader, TextLoader,
    detect_language, get_document_loader, get_supported_extensions, load_file, loader_for_path,
};
pub use markdown::{
    Heading, Section, determine_split_level, extract_headings, first_heading, split_sections,
};

/// Free-form document metadata, kept sorted so stored records are stable.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Text extracted from a file, plus what the loader learned about it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    /// Extracted plain text.
    pub text: String,
    /// Loader-provided metadata such as `source_type` and `file_extension`.
    pub metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use std::fs;

    use ayd_config::ChunkingConfig;

    use super::*;

    #[test]
    fn test_load_and_chunk_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.md");
        fs::write(
            &path,
            "---\ntitle: Guide\ntags: [setup]\n---\n# Install\n\nRun the installer.\n",
        )
        .unwrap();

        let doc = load_file(&path).unwrap().remove(0);
        assert_eq!(doc.metadata["title"], "Guide");

        let chunks = Chunker::new(&ChunkingConfig::default()).chunk(&doc.text);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.contains("Run the installer."));
    }
}
