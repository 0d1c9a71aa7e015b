//! Collection layout on disk.
//!
//! A collection lives in `<storage path>/<collection name>/`:
//!
//! ```text
//! vectors.json    chunk text, metadata and embeddings
//! keyword/        tantivy index over chunk text
//! manifest.json   ingested files and their hashes
//! config_hash     hash of the settings the data was built with
//! .lock           present while a writer is open
//! ```

use std::path::{Path, PathBuf};

/// Paths of every file in a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPaths {
    /// Collection directory.
    pub root: PathBuf,
    /// Vector records.
    pub vectors: PathBuf,
    /// Keyword index directory.
    pub keyword: PathBuf,
    /// Ingestion manifest.
    pub manifest: PathBuf,
    /// Stored config hash.
    pub config_hash: PathBuf,
    /// Writer lock file.
    pub lock: PathBuf,
}

impl CollectionPaths {
    /// Lays out the collection `name` under `storage_path`.
    pub fn new(storage_path: &Path, name: &str) -> Self {
        let root = storage_path.join(name);
        Self {
            vectors: root.join("vectors.json"),
            keyword: root.join("keyword"),
            manifest: root.join("manifest.json"),
            config_hash: root.join("config_hash"),
            lock: root.join(".lock"),
            root,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn collection_layout() {
        let paths = CollectionPaths::new(Path::new("/data/storage"), "documents");
        assert_eq!(paths.root, PathBuf::from("/data/storage/documents"));
        assert_eq!(paths.vectors, PathBuf::from("/data/storage/documents/vectors.json"));
        assert_eq!(paths.keyword, PathBuf::from("/data/storage/documents/keyword"));
        assert_eq!(paths.manifest, PathBuf::from("/data/storage/documents/manifest.json"));
        assert_eq!(paths.config_hash, PathBuf::from("/data/storage/documents/config_hash"));
        assert_eq!(paths.lock, PathBuf::from("/data/storage/documents/.lock"));
    }
}
