//! Manifest of ingested files.
//!
//! The manifest records every ingested file with the hash of its contents, so
//! unchanged files can be skipped and vanished files detected on the next run.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    IndexError,
    persist::{read_json, write_json_atomic},
};

/// One ingested file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// MD5 of the file contents, as lowercase hex.
    pub document_hash: String,
    /// Modification time when ingested.
    pub mtime: DateTime<Utc>,
    /// File size in bytes.
    pub size: u64,
    /// Number of chunks stored for the file.
    pub chunk_count: usize,
    /// When the file was ingested.
    pub ingested_at: DateTime<Utc>,
    /// Ingestion root the file was discovered under.
    pub source_root: PathBuf,
}

/// Ingested files keyed by absolute path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Entries by absolute path.
    #[serde(default)]
    entries: BTreeMap<PathBuf, ManifestEntry>,
}

impl Manifest {
    /// Creates an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the manifest, returning an empty one if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        Ok(read_json(path)?.unwrap_or_default())
    }

    /// Saves the manifest atomically.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        write_json_atomic(path, self, true)
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, path: PathBuf, entry: ManifestEntry) {
        self.entries.insert(path, entry);
    }

    /// Removes an entry.
    pub fn remove(&mut self, path: &Path) -> Option<ManifestEntry> {
        self.entries.remove(path)
    }

    /// Looks up an entry.
    pub fn get(&self, path: &Path) -> Option<&ManifestEntry> {
        self.entries.get(path)
    }

    /// Iterates over entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = (&PathBuf, &ManifestEntry)> {
        self.entries.iter()
    }

    /// Paths of entries discovered under `root`.
    pub fn paths_under(&self, root: &Path) -> Vec<PathBuf> {
        self.entries
            .iter()
            .filter(|(path, entry)| entry.source_root == root || path.starts_with(root))
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Distinct ingestion roots, sorted.
    pub fn source_roots(&self) -> Vec<PathBuf> {
        self.entries
            .values()
            .map(|e| e.source_root.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
