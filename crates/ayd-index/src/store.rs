//! The collection store: vectors, keyword index and manifest behind one handle.

use std::{
    fs,
    io::ErrorKind,
    path::{self, Component, Path, PathBuf},
};

use ayd_config::Config;
use ayd_document::Metadata;
use md5::{Digest, Md5};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    ChunkHit, IndexError,
    config_hash::compute_config_hash,
    keyword::{self, KeywordWriter},
    location::CollectionPaths,
    lock::WriterLock,
    manifest::{Manifest, ManifestEntry},
    status::{IndexStatus, read_stored_hash, write_config_hash},
    vectors::{VectorCollection, VectorRecord},
};

/// Storage statistics for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageStats {
    /// Number of ingested files.
    pub document_count: usize,
    /// Number of stored chunks.
    pub chunk_count: usize,
    /// Human-readable collection size.
    pub storage_size: String,
    /// Collection size in bytes.
    pub storage_bytes: u64,
    /// Storage directory.
    pub storage_path: PathBuf,
    /// Collection name.
    pub collection_name: String,
    /// Embedding model of the stored vectors.
    pub embedding_model: String,
    /// Vector dimension, zero when empty.
    pub dimension: usize,
}

/// A chunk ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    /// Chunk text.
    pub text: String,
    /// Document and chunk metadata.
    pub metadata: Metadata,
    /// Normalised embedding.
    pub embedding: Vec<f32>,
}

/// Handle to one collection under the storage path.
#[derive(Debug, Clone)]
pub struct VectorStoreManager {
    /// Storage directory holding all collections.
    storage_path: PathBuf,
    /// Collection name.
    collection_name: String,
    /// Files of the collection.
    paths: CollectionPaths,
    /// Configured embedding model, recorded in new collections.
    embedding_model: String,
    /// Keyword index stemmer.
    stemmer: String,
    /// Hash of the current ingestion settings.
    config_hash: String,
}

impl VectorStoreManager {
    /// Opens the collection configured in `config`, resolving `storage.path`
    /// against `cwd` and `data_dir`.
    pub fn new(config: &Config, cwd: &Path, data_dir: &Path) -> Result<Self, IndexError> {
        let storage_path = config.storage.resolve_path(cwd, data_dir)?;
        Ok(Self::at(config, storage_path))
    }

    /// Opens the configured collection under an explicit storage directory.
    pub fn at(config: &Config, storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();
        let collection_name = config.storage.collection_name.clone();
        Self {
            paths: CollectionPaths::new(&storage_path, &collection_name),
            storage_path,
            collection_name,
            embedding_model: config.embedding.model.clone(),
            stemmer: config.retrieval.stemmer.clone(),
            config_hash: compute_config_hash(config),
        }
    }

    /// Storage directory.
    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// Collection name.
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Files of the collection.
    pub const fn paths(&self) -> &CollectionPaths {
        &self.paths
    }

    /// Hash of the current ingestion settings.
    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    /// MD5 of the file contents as 32 lowercase hex characters.
    pub fn get_document_hash(&self, path: &Path) -> Result<String, IndexError> {
        document_hash(path)
    }

    /// True when the file is in the manifest with its current contents.
    pub fn is_document_indexed(&self, path: &Path) -> Result<bool, IndexError> {
        let abs = absolute(path)?;
        let manifest = self.manifest()?;
        let Some(entry) = manifest.get(&abs) else {
            return Ok(false);
        };
        Ok(entry.document_hash == document_hash(&abs)?)
    }

    /// True when the file is in the manifest, whatever its contents.
    pub fn is_document_known(&self, path: &Path) -> Result<bool, IndexError> {
        let abs = absolute(path)?;
        Ok(self.manifest()?.get(&abs).is_some())
    }

    /// Loads the manifest.
    pub fn manifest(&self) -> Result<Manifest, IndexError> {
        Manifest::load(&self.paths.manifest)
    }

    /// Loads the last committed vector collection, empty if none.
    pub fn collection(&self) -> Result<VectorCollection, IndexError> {
        Ok(VectorCollection::load(&self.paths.vectors)?
            .unwrap_or_else(|| VectorCollection::new(&self.collection_name, &self.embedding_model)))
    }

    /// Number of stored chunks.
    pub fn get_document_count(&self) -> Result<usize, IndexError> {
        Ok(self.collection()?.len())
    }

    /// Number of ingested files.
    pub fn get_file_count(&self) -> Result<usize, IndexError> {
        Ok(self.manifest()?.len())
    }

    /// True if at least one chunk is stored. Unreadable data counts as not ready.
    pub fn is_ready(&self) -> bool {
        self.get_document_count().is_ok_and(|n| n > 0)
    }

    /// Collects storage statistics.
    pub fn get_stats(&self) -> Result<StorageStats, IndexError> {
        let collection = self.collection()?;
        let storage_bytes = directory_size(&self.paths.root);
        Ok(StorageStats {
            document_count: self.get_file_count()?,
            chunk_count: collection.len(),
            storage_size: format_size(storage_bytes),
            storage_bytes,
            storage_path: self.storage_path.clone(),
            collection_name: self.collection_name.clone(),
            embedding_model: collection.embedding_model,
            dimension: collection.dimension,
        })
    }

    /// Compares the stored config hash with the current settings.
    pub fn index_status(&self) -> IndexStatus {
        IndexStatus::from_hashes(
            read_stored_hash(&self.paths.config_hash).as_deref(),
            &self.config_hash,
        )
    }

    /// Takes the writer lock and loads the collection for modification.
    pub fn open_writer(&self) -> Result<StoreWriter, IndexError> {
        let lock = WriterLock::acquire(&self.paths.lock)?;
        let collection = self.collection()?;
        let keyword = KeywordWriter::open(&self.paths.keyword, &self.stemmer)?;
        let manifest = self.manifest()?;
        debug!(
            collection = %self.collection_name,
            chunks = collection.len(),
            files = manifest.len(),
            "opened collection writer"
        );
        Ok(StoreWriter {
            lock,
            paths: self.paths.clone(),
            collection,
            keyword,
            manifest,
            config_hash: self.config_hash.clone(),
        })
    }

    /// Chunks most similar to `embedding`, best first, scoring at least `threshold`.
    pub fn query_vectors(
        &self,
        embedding: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<ChunkHit>, IndexError> {
        let collection = self.collection()?;
        let hits = collection
            .query(embedding, top_k, threshold)?
            .into_iter()
            .map(|(record, score)| chunk_hit(record, score))
            .collect();
        Ok(hits)
    }

    /// BM25 search over chunk text and file names.
    pub fn keyword_search(&self, query: &str, limit: usize) -> Result<Vec<ChunkHit>, IndexError> {
        keyword::search(&self.paths.keyword, &self.stemmer, query, limit)
    }

    /// Deletes the collection directory. A missing collection is not an error.
    ///
    /// Fails with [`IndexError::Locked`] while a writer is active.
    pub fn reset(&self) -> Result<(), IndexError> {
        if !self.paths.root.exists() {
            return Ok(());
        }
        let _lock = WriterLock::acquire(&self.paths.lock)?;
        match fs::remove_dir_all(&self.paths.root) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(IndexError::io(&self.paths.root, e)),
        }
        info!(path = %self.paths.root.display(), "collection reset");
        Ok(())
    }
}

/// Pending modifications to a collection. Dropping it releases the lock.
pub struct StoreWriter {
    /// Held until the writer is dropped.
    lock: WriterLock,
    /// Files of the collection.
    paths: CollectionPaths,
    /// In-memory vector records.
    collection: VectorCollection,
    /// Keyword index writer.
    keyword: KeywordWriter,
    /// In-memory manifest.
    manifest: Manifest,
    /// Hash written on commit.
    config_hash: String,
}

impl StoreWriter {
    /// Replaces every stored chunk of the document at `path`.
    pub fn add_document(
        &mut self,
        path: &Path,
        chunks: Vec<ChunkRecord>,
        entry: ManifestEntry,
    ) -> Result<(), IndexError> {
        let document_id = path.to_string_lossy().into_owned();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        for chunk in &chunks {
            self.collection.check_dimension(chunk.embedding.len())?;
        }

        self.collection.remove_document(&document_id);
        self.keyword.delete_document(&document_id);
        let mut records = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.into_iter().enumerate() {
            let record = VectorRecord {
                id: VectorRecord::chunk_id(&document_id, index),
                document_id: document_id.clone(),
                text: chunk.text,
                metadata: chunk.metadata,
                embedding: chunk.embedding,
            };
            self.keyword
                .add_chunk(&record.id, &document_id, &document_id, &file_name, &record.text)?;
            records.push(record);
        }
        self.collection.insert(records)?;
        self.manifest.insert(path.to_path_buf(), entry);
        Ok(())
    }

    /// Removes a document. Returns false if it was not stored.
    pub fn remove_document(&mut self, path: &Path) -> bool {
        let document_id = path.to_string_lossy();
        let removed = self.collection.remove_document(&document_id);
        self.keyword.delete_document(&document_id);
        let known = self.manifest.remove(path).is_some();
        known || removed > 0
    }

    /// Records the embedding model of an empty collection.
    ///
    /// A populated collection keeps its model; a different one is logged.
    pub fn set_embedding_model(&mut self, model: &str) {
        if self.collection.is_empty() {
            self.collection.embedding_model = model.to_string();
        } else if self.collection.embedding_model != model {
            warn!(
                stored = %self.collection.embedding_model,
                configured = model,
                "embedding model differs from the stored vectors; run 'askyourdocs refresh --full'"
            );
        }
    }

    /// The manifest including uncommitted changes.
    pub const fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Lock file held by this writer.
    pub fn lock_path(&self) -> &Path {
        self.lock.path()
    }

    /// Persists all changes.
    pub fn commit(&mut self) -> Result<(), IndexError> {
        self.keyword.commit()?;
        self.collection.save(&self.paths.vectors)?;
        self.manifest.save(&self.paths.manifest)?;
        write_config_hash(&self.paths.config_hash, &self.config_hash)?;
        debug!(
            chunks = self.collection.len(),
            files = self.manifest.len(),
            "committed collection"
        );
        Ok(())
    }
}

/// MD5 of the file contents as 32 lowercase hex characters.
pub fn document_hash(path: &Path) -> Result<String, IndexError> {
    let contents = fs::read(path).map_err(|e| IndexError::io(path, e))?;
    let digest = Md5::digest(&contents);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

/// Makes `file` absolute against the working directory and folds away `.`
/// and `..` components without resolving symlinks.
///
/// Manifest keys are built from this, so every spelling of a path must land
/// on the same key even after the file is gone.
pub fn absolute(file: &Path) -> Result<PathBuf, IndexError> {
    let abs = path::absolute(file).map_err(|e| IndexError::io(file, e))?;
    let mut normalized = PathBuf::new();
    for component in abs.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

/// Formats a byte count as "0 B", "512 B", "1.2 KB", "3.4 MB".
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}

/// Sum of file sizes under `root`, zero if it does not exist.
fn directory_size(root: &Path) -> u64 {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|e| e.metadata().ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum()
}

/// Builds a hit from a stored record.
fn chunk_hit(record: &VectorRecord, score: f32) -> ChunkHit {
    let meta = |key: &str| match record.metadata.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    };
    let file_path = meta("file_path").unwrap_or_else(|| record.document_id.clone());
    let file_name = meta("file_name").unwrap_or_else(|| {
        Path::new(&file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    ChunkHit {
        id: record.id.clone(),
        document_id: record.document_id.clone(),
        file_path,
        file_name,
        text: record.text.clone(),
        score,
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;

    fn store(temp: &TempDir) -> VectorStoreManager {
        VectorStoreManager::at(&Config::default(), temp.path().join("storage"))
    }

    fn entry(hash: &str, chunk_count: usize) -> ManifestEntry {
        ManifestEntry {
            document_hash: hash.into(),
            mtime: Utc::now(),
            size: 5,
            chunk_count,
            ingested_at: Utc::now(),
            source_root: PathBuf::from("/docs"),
        }
    }

    fn chunk(text: &str, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            text: text.into(),
            metadata: Metadata::new(),
            embedding,
        }
    }

    #[test]
    fn empty_store() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        assert!(!store.is_ready());
        assert_eq!(store.get_document_count().unwrap(), 0);
        assert_eq!(store.index_status(), IndexStatus::Missing);
        assert!(store.keyword_search("anything", 5).unwrap().is_empty());
        assert!(store.query_vectors(&[1.0], 5, 0.0).unwrap().is_empty());

        let stats = store.get_stats().unwrap();
        assert_eq!(stats.storage_size, "0 B");
        assert_eq!(stats.collection_name, "documents");
        store.reset().unwrap();
    }

    #[test]
    fn write_commit_and_query() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let path = Path::new("/docs/rust.md");
        {
            let mut writer = store.open_writer().unwrap();
            writer
                .add_document(
                    path,
                    vec![chunk("ownership rules", vec![1.0, 0.0]), chunk("borrowing", vec![0.0, 1.0])],
                    entry("abc", 2),
                )
                .unwrap();
            writer.commit().unwrap();
        }
        assert!(!store.paths().lock.exists());
        assert!(store.is_ready());
        assert_eq!(store.get_document_count().unwrap(), 2);
        assert_eq!(store.get_file_count().unwrap(), 1);
        assert_eq!(store.index_status(), IndexStatus::Current);

        let hits = store.query_vectors(&[1.0, 0.0], 1, 0.0).unwrap();
        assert_eq!(hits[0].id, "/docs/rust.md#0");
        assert_eq!(hits[0].file_name, "rust.md");

        let hits = store.keyword_search("ownership", 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file_path, "/docs/rust.md");

        let stats = store.get_stats().unwrap();
        assert!(stats.storage_bytes > 0);
        assert_eq!(stats.dimension, 2);
    }

    #[test]
    fn add_replaces_previous_chunks() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let path = Path::new("/docs/a.md");
        let mut writer = store.open_writer().unwrap();
        writer
            .add_document(path, vec![chunk("one", vec![1.0]), chunk("two", vec![1.0])], entry("h1", 2))
            .unwrap();
        writer.add_document(path, vec![chunk("three", vec![1.0])], entry("h2", 1)).unwrap();
        writer.commit().unwrap();
        drop(writer);

        assert_eq!(store.get_document_count().unwrap(), 1);
        assert!(store.keyword_search("one", 5).unwrap().is_empty());
        assert_eq!(store.keyword_search("three", 5).unwrap().len(), 1);
    }

    #[test]
    fn remove_document() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let path = Path::new("/docs/a.md");
        let mut writer = store.open_writer().unwrap();
        writer.add_document(path, vec![chunk("text", vec![1.0])], entry("h", 1)).unwrap();
        assert!(writer.remove_document(path));
        assert!(!writer.remove_document(path));
        writer.commit().unwrap();
        drop(writer);
        assert!(!store.is_ready());
    }

    #[test]
    fn second_writer_is_locked() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let writer = store.open_writer().unwrap();
        assert!(matches!(store.open_writer(), Err(IndexError::Locked { .. })));
        assert!(matches!(store.reset(), Err(IndexError::Locked { .. })));
        drop(writer);
        store.open_writer().unwrap();
    }

    #[test]
    fn config_change_is_detected() {
        let temp = TempDir::new().unwrap();
        let mut writer = store(&temp).open_writer().unwrap();
        writer.commit().unwrap();
        drop(writer);

        let mut config = Config::default();
        config.chunking.chunk_size = 300;
        let changed = VectorStoreManager::at(&config, temp.path().join("storage"));
        assert_eq!(changed.index_status(), IndexStatus::ConfigChanged);
    }

    #[test]
    fn document_hash_and_indexed() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let file = temp.path().join("doc.txt");
        fs::write(&file, "hello").unwrap();
        let hash = store.get_document_hash(&file).unwrap();
        assert_eq!(hash, "5d41402abc4b2a76b9719d911017c592");

        assert!(!store.is_document_known(&file).unwrap());
        let mut writer = store.open_writer().unwrap();
        writer.add_document(&file, vec![chunk("hello", vec![1.0])], entry(&hash, 1)).unwrap();
        writer.commit().unwrap();
        drop(writer);
        assert!(store.is_document_indexed(&file).unwrap());

        fs::write(&file, "changed").unwrap();
        assert!(!store.is_document_indexed(&file).unwrap());
        assert!(store.is_document_known(&file).unwrap());
    }

    #[test]
    fn reset_removes_collection() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let mut writer = store.open_writer().unwrap();
        writer.add_document(Path::new("/a.md"), vec![chunk("x", vec![1.0])], entry("h", 1)).unwrap();
        writer.commit().unwrap();
        drop(writer);
        store.reset().unwrap();
        assert!(!store.paths().root.exists());
        assert_eq!(store.index_status(), IndexStatus::Missing);
    }

    #[test]
    fn new_resolves_storage_path() {
        let temp = TempDir::new().unwrap();
        let store = VectorStoreManager::new(&Config::default(), temp.path(), &temp.path().join("data")).unwrap();
        assert_eq!(store.storage_path(), temp.path().join("data").join("storage"));

        let mut config = Config::default();
        config.storage.path = Some("local-store".into());
        let store = VectorStoreManager::new(&config, temp.path(), &temp.path().join("data")).unwrap();
        assert_eq!(store.storage_path(), temp.path().join("local-store"));
    }

    #[test]
    fn absolute_folds_dot_components() {
        assert_eq!(
            absolute(Path::new("/docs/sub/../guide/./a.md")).unwrap(),
            PathBuf::from("/docs/guide/a.md")
        );
        assert_eq!(absolute(Path::new("/../a.md")).unwrap(), PathBuf::from("/a.md"));

        let relative = absolute(Path::new("notes/../a.txt")).unwrap();
        assert!(relative.is_absolute());
        assert!(relative.ends_with("a.txt"));
        assert!(!relative.components().any(|c| c == Component::ParentDir));
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1229), "1.2 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
