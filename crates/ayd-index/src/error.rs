//! Error types for the ayd-index crate.

use std::{io, path::PathBuf};

use ayd_config::ConfigError;
use ayd_document::DocumentError;
use ayd_llm::LlmError;
use notify_debouncer_full::notify;
use thiserror::Error;

/// Errors raised by storage, ingestion and watching.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Failed to open or create the keyword index.
    #[error("failed to open keyword index at {path}: {message}")]
    OpenIndex {
        /// Path to the index directory.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to write to the keyword index.
    #[error("failed to write to keyword index: {0}")]
    Write(String),

    /// Failed to commit the keyword index.
    #[error("failed to commit keyword index: {0}")]
    Commit(String),

    /// A keyword search failed.
    #[error("keyword search failed: {0}")]
    Search(String),

    /// I/O on a specific path failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A persisted JSON file could not be read or written.
    #[error("corrupt or unreadable {path}: {message}")]
    Serde {
        /// Path to the file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Another process holds the writer lock.
    #[error("collection is locked by another process ({path}); remove the file if no ingest is running")]
    Locked {
        /// Lock file path.
        path: PathBuf,
    },

    /// An ingestion path does not exist.
    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),

    /// Embedding vectors do not match the collection.
    #[error("embedding dimension {found} does not match the collection dimension {expected}; run 'askyourdocs refresh --full'")]
    DimensionMismatch {
        /// Dimension stored in the collection.
        expected: usize,
        /// Dimension of the new vector.
        found: usize,
    },

    /// Invalid stemmer language.
    #[error("unsupported stemmer language: {0}")]
    InvalidLanguage(String),

    /// Configuration error, e.g. a bad glob pattern.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A document could not be loaded.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The embedding provider failed.
    #[error(transparent)]
    Embedding(#[from] LlmError),

    /// The file watcher failed.
    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl IndexError {
    /// A follow-up suggestion for the user, when there is one.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Embedding(e) => e.hint(),
            Self::PathNotFound(_) => Some("check the path and try again".into()),
            Self::OpenIndex { .. } | Self::Serde { .. } => {
                Some("run 'askyourdocs reset' to rebuild the collection".into())
            }
            _ => None,
        }
    }

    /// Creates an `Io` error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an `OpenIndex` error from a path and Tantivy error.
    pub fn open_index(path: impl Into<PathBuf>, source: &tantivy::TantivyError) -> Self {
        Self::OpenIndex {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a `Write` error from a Tantivy error.
    pub fn write(source: &tantivy::TantivyError) -> Self {
        Self::Write(source.to_string())
    }

    /// Creates a `Commit` error from a Tantivy error.
    pub fn commit(source: &tantivy::TantivyError) -> Self {
        Self::Commit(source.to_string())
    }

    /// Creates a `Search` error from a Tantivy error.
    pub fn search(source: &tantivy::TantivyError) -> Self {
        Self::Search(source.to_string())
    }
}
