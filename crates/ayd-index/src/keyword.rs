//! Tantivy keyword index over chunk text.

use std::{fs, path::Path};

use tantivy::{
    Index, IndexWriter, TantivyDocument, TantivyError, Term, collector::TopDocs,
    directory::MmapDirectory, query::QueryParser, schema::Value,
};
use tracing::debug;

use crate::{
    ChunkHit, IndexError,
    analyzer::{AYD_TOKENIZER, build_analyzer},
    schema::{FILE_NAME_BOOST, KeywordSchema},
};

/// Heap size for the index writer (50 MB).
const WRITER_HEAP_SIZE: usize = 50_000_000;

/// Opens or creates the index at `path` and registers the analyzer for
/// `stemmer`.
fn open_index(path: &Path, stemmer: &str, schema: &KeywordSchema) -> Result<Index, IndexError> {
    fs::create_dir_all(path).map_err(|e| IndexError::io(path, e))?;
    let dir = MmapDirectory::open(path).map_err(|e| {
        let err: TantivyError = e.into();
        IndexError::open_index(path, &err)
    })?;
    let index = Index::open_or_create(dir, schema.schema().clone())
        .map_err(|e| IndexError::open_index(path, &e))?;
    index
        .tokenizers()
        .register(AYD_TOKENIZER, build_analyzer(stemmer)?);
    Ok(index)
}

/// Returns true if a committed index exists at `path`.
pub fn keyword_index_exists(path: &Path) -> bool {
    path.join("meta.json").exists()
}

/// Stages chunk additions and deletions for the keyword index.
pub struct KeywordWriter {
    /// The underlying Tantivy writer.
    writer: IndexWriter,
    /// Schema with field handles.
    schema: KeywordSchema,
}

impl KeywordWriter {
    /// Opens or creates the index at `path`.
    pub fn open(path: &Path, stemmer: &str) -> Result<Self, IndexError> {
        let schema = KeywordSchema::new();
        let index = open_index(path, stemmer, &schema)?;
        let writer = index
            .writer(WRITER_HEAP_SIZE)
            .map_err(|e| IndexError::open_index(path, &e))?;
        Ok(Self { writer, schema })
    }

    /// Stages one chunk.
    pub fn add_chunk(
        &mut self,
        id: &str,
        document_id: &str,
        file_path: &str,
        file_name: &str,
        body: &str,
    ) -> Result<(), IndexError> {
        let mut doc = TantivyDocument::new();
        doc.add_text(self.schema.id, id);
        doc.add_text(self.schema.document_id, document_id);
        doc.add_text(self.schema.file_path, file_path);
        doc.add_text(self.schema.file_name, file_name);
        doc.add_text(self.schema.body, body);
        self.writer
            .add_document(doc)
            .map_err(|e| IndexError::write(&e))?;
        Ok(())
    }

    /// Stages deletion of every chunk belonging to `document_id`.
    ///
    /// Chunks added after this call in the same commit are kept.
    pub fn delete_document(&mut self, document_id: &str) {
        let term = Term::from_field_text(self.schema.document_id, document_id);
        self.writer.delete_term(term);
    }

    /// Makes staged changes visible to readers.
    pub fn commit(&mut self) -> Result<(), IndexError> {
        self.writer.commit().map_err(|e| IndexError::commit(&e))?;
        Ok(())
    }
}

/// BM25 search over `body` and `file_name`.
///
/// The query is parsed leniently: syntax errors are ignored rather than
/// reported. A missing or empty index yields no hits.
pub fn search(
    path: &Path,
    stemmer: &str,
    query: &str,
    limit: usize,
) -> Result<Vec<ChunkHit>, IndexError> {
    if !keyword_index_exists(path) || query.trim().is_empty() || limit == 0 {
        return Ok(Vec::new());
    }
    let schema = KeywordSchema::new();
    let index = open_index(path, stemmer, &schema)?;
    let reader = index.reader().map_err(|e| IndexError::search(&e))?;
    let searcher = reader.searcher();
    if searcher.num_docs() == 0 {
        return Ok(Vec::new());
    }

    let mut parser = QueryParser::for_index(&index, vec![schema.body, schema.file_name]);
    parser.set_field_boost(schema.file_name, FILE_NAME_BOOST);
    let (parsed, errors) = parser.parse_query_lenient(query);
    if !errors.is_empty() {
        debug!(?errors, query, "lenient keyword query parse");
    }

    let top_docs = searcher
        .search(&parsed, &TopDocs::with_limit(limit))
        .map_err(|e| IndexError::search(&e))?;

    let text = |doc: &TantivyDocument, field| {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    let mut hits = Vec::with_capacity(top_docs.len());
    for (score, address) in top_docs {
        let doc: TantivyDocument = searcher.doc(address).map_err(|e| IndexError::search(&e))?;
        hits.push(ChunkHit {
            id: text(&doc, schema.id),
            document_id: text(&doc, schema.document_id),
            file_path: text(&doc, schema.file_path),
            file_name: text(&doc, schema.file_name),
            text: text(&doc, schema.body),
            score,
        });
    }
    Ok(hits)
}
