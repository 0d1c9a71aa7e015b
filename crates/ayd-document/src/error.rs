//! Error types for document loading.

use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Errors that can occur when loading documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Failed to read a file.
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// No loader handles this file's extension.
    #[error("unsupported file type: {path}")]
    UnsupportedFileType {
        /// Path to the unsupported file.
        path: PathBuf,
    },

    /// The file contained no extractable text.
    #[error("no text could be extracted from {path}")]
    Empty {
        /// Path to the empty document.
        path: PathBuf,
    },

    /// A structured format could not be decoded.
    #[error("failed to parse {format} file {path}: {message}")]
    Parse {
        /// Path to the file that failed.
        path: PathBuf,
        /// Human-readable format name, e.g. `PDF`.
        format: &'static str,
        /// Description of the failure.
        message: String,
    },
}

impl DocumentError {
    /// Builds a [`DocumentError::Parse`] from any displayable error.
    pub fn parse(path: &Path, format: &'static str, err: impl ToString) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            format,
            message: err.to_string(),
        }
    }
}
