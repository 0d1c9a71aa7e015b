//! Configuration hash computation for collection versioning.
//!
//! The collection stores a hash of the settings that shaped its data. When any
//! of them changes, stored chunks and vectors no longer match what a fresh
//! ingest would produce and the collection needs a full rebuild.
//!
//! Settings that affect the hash:
//! - Schema version (internal, bumped when the stored format changes)
//! - Embedding provider and model
//! - Chunking strategy, size, overlap, boundary handling and minimum size
//! - Stemmer language

use std::hash::{Hash, Hasher};

use ayd_config::{ChunkStrategy, Config, EmbeddingProvider};
use siphasher::sip::SipHasher24;

/// Current schema version. Bump this when the stored format changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Settings that affect stored data and are included in the config hash.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct IngestSettings {
    /// Schema version.
    pub schema_version: u32,
    /// Embedding backend.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model name.
    pub embedding_model: String,
    /// Chunking strategy.
    pub strategy: ChunkStrategy,
    /// Maximum chunk size.
    pub chunk_size: usize,
    /// Chunk overlap.
    pub chunk_overlap: usize,
    /// Whether fixed windows snap to whitespace.
    pub respect_boundaries: bool,
    /// Minimum trailing chunk size.
    pub min_chunk_size: usize,
    /// Keyword index stemmer.
    pub stemmer: String,
}

impl IngestSettings {
    /// Extracts the hashed settings from a config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            embedding_provider: config.embedding.provider,
            embedding_model: config.embedding.model.clone(),
            strategy: config.chunking.strategy,
            chunk_size: config.chunking.chunk_size,
            chunk_overlap: config.chunking.chunk_overlap,
            respect_boundaries: config.chunking.respect_boundaries,
            min_chunk_size: config.chunking.min_chunk_size,
            stemmer: config.retrieval.stemmer.to_lowercase(),
        }
    }

    /// Computes the hash as a 16-digit hex string.
    pub fn hash_string(&self) -> String {
        let mut hasher = SipHasher24::new();
        self.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

/// Computes the config hash for `config`.
pub fn compute_config_hash(config: &Config) -> String {
    IngestSettings::from_config(config).hash_string()
}
