//! Storage and ingestion for AskYourDocs.
//!
//! A collection keeps chunk embeddings in a JSON vector file and the same
//! chunks in a Tantivy keyword index, plus a manifest of ingested files. The
//! [`DocumentIngestor`] fills it incrementally; [`watch`] keeps it current.

#![warn(missing_docs)]

mod analyzer;
mod config_hash;
mod discovery;
mod error;
mod ingest;
mod keyword;
mod location;
mod lock;
mod manifest;
mod persist;
mod schema;
mod status;
mod store;
mod vectors;
mod watch;

pub use analyzer::{AYD_TOKENIZER, build_analyzer, parse_language};
pub use config_hash::{IngestSettings, SCHEMA_VERSION, compute_config_hash};
pub use discovery::{SKIP_DIRS, discover_files, filter_files, should_process_file};
pub use error::IndexError;
pub use ingest::{DocumentIngestor, IngestOptions, IngestStats, ProgressReporter, SilentReporter};
pub use location::CollectionPaths;
pub use lock::{STALE_LOCK_AGE, WriterLock};
pub use manifest::{Manifest, ManifestEntry};
pub use schema::{FILE_NAME_BOOST, KeywordSchema};
use serde::Serialize;
pub use status::IndexStatus;
pub use store::{
    ChunkRecord, StorageStats, StoreWriter, VectorStoreManager, document_hash, format_size,
};
pub use vectors::{VectorCollection, VectorRecord, cosine_similarity};
pub use watch::{ChangeBatch, ChangeKind, DocumentChangeHandler, watch};

/// A stored chunk returned by a vector or keyword search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkHit {
    /// Chunk id, `<document_id>#<index>`.
    pub id: String,
    /// Owning document.
    pub document_id: String,
    /// Absolute source path.
    pub file_path: String,
    /// File name.
    pub file_name: String,
    /// Chunk text.
    pub text: String,
    /// Cosine similarity or BM25 score.
    pub score: f32,
}
