//! Word documents (`.docx`).

use std::{
    fs::File,
    io::{Read, Seek},
    path::Path,
};

use quick_xml::{Reader, events::Event};
use serde_json::Value as JsonValue;
use zip::{ZipArchive, result::ZipError};

use super::{DocumentLoader, base_metadata, non_empty};
use crate::{DocumentError, LoadedDocument};

/// Archive member holding the document body.
const DOCUMENT_XML: &str = "word/document.xml";

/// Reads paragraph text from the main document part of a `.docx` archive.
#[derive(Debug, Clone, Copy)]
pub struct DocxLoader;

impl DocumentLoader for DocxLoader {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".docx"]
    }

    fn load(&self, path: &Path) -> Result<Vec<LoadedDocument>, DocumentError> {
        let file = File::open(path).map_err(|source| DocumentError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let xml = read_document_xml(file).map_err(|e| DocumentError::parse(path, "DOCX", e))?;
        let (text, paragraphs) =
            extract_plaintext(&xml).map_err(|e| DocumentError::parse(path, "DOCX", e))?;
        let text = non_empty(path, text)?;

        let mut metadata = base_metadata(path, "docx");
        metadata.insert("paragraph_count".into(), JsonValue::from(paragraphs));
        Ok(vec![LoadedDocument { text, metadata }])
    }
}

/// Reads `word/document.xml` out of the archive.
fn read_document_xml(reader: impl Read + Seek) -> Result<String, ZipError> {
    let mut archive = ZipArchive::new(reader)?;
    let mut entry = archive.by_name(DOCUMENT_XML)?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Extracts paragraph text from WordprocessingML, returning the text and the
/// number of non-empty paragraphs.
fn extract_plaintext(xml: &str) -> Result<(String, usize), quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut paragraph = String::new();
    let mut paragraphs = 0;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    let line = paragraph.trim_end();
                    if !line.is_empty() {
                        out.push_str(line);
                        out.push('\n');
                        paragraphs += 1;
                    }
                    paragraph.clear();
                }
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => paragraph.push('\t'),
                b"w:br" | b"w:cr" => paragraph.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => paragraph.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((out, paragraphs))
}
