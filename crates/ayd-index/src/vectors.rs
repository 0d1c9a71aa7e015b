//! The vector collection: chunk records with their embeddings.

use std::{cmp::Ordering, collections::BTreeSet, path::Path};

use ayd_document::Metadata;
use serde::{Deserialize, Serialize};

use crate::{
    IndexError,
    persist::{read_json, write_json_atomic},
};

/// One stored chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// `<document_id>#<chunk index>`.
    pub id: String,
    /// Absolute path of the source document.
    pub document_id: String,
    /// Chunk text.
    pub text: String,
    /// Document and chunk metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// L2-normalised embedding.
    pub embedding: Vec<f32>,
}

impl VectorRecord {
    /// Builds the record id for chunk `index` of `document_id`.
    pub fn chunk_id(document_id: &str, index: usize) -> String {
        format!("{document_id}#{index}")
    }
}

/// All records of a collection, persisted as `vectors.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorCollection {
    /// Collection name.
    pub name: String,
    /// Identifier of the embedding model that produced the vectors.
    pub embedding_model: String,
    /// Vector dimension, zero until the first record is inserted.
    pub dimension: usize,
    /// Stored records.
    #[serde(default)]
    pub records: Vec<VectorRecord>,
}

impl VectorCollection {
    /// Creates an empty collection.
    pub fn new(name: impl Into<String>, embedding_model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            embedding_model: embedding_model.into(),
            dimension: 0,
            records: Vec::new(),
        }
    }

    /// Loads the collection at `path`, or `None` if nothing was saved yet.
    pub fn load(path: &Path) -> Result<Option<Self>, IndexError> {
        read_json(path)
    }

    /// Saves the collection atomically.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        write_json_atomic(path, self, false)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct documents.
    pub fn document_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.document_id.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Removes every record of `document_id`, returning how many were removed.
    pub fn remove_document(&mut self, document_id: &str) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.document_id != document_id);
        before - self.records.len()
    }

    /// Appends records, fixing the dimension on first insert.
    ///
    /// Nothing is inserted if any record has the wrong dimension.
    pub fn insert(&mut self, records: Vec<VectorRecord>) -> Result<(), IndexError> {
        let mut dimension = self.dimension;
        for record in &records {
            let found = record.embedding.len();
            if dimension == 0 {
                dimension = found;
            } else if found != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    found,
                });
            }
        }
        self.dimension = dimension;
        self.records.extend(records);
        Ok(())
    }

    /// Returns the records most similar to `embedding`, best first.
    ///
    /// Scores are cosine similarities; records scoring below `threshold` are
    /// dropped. Equal scores are ordered by record id.
    pub fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<(&VectorRecord, f32)>, IndexError> {
        if self.records.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        self.check_dimension(embedding.len())?;

        let mut scored: Vec<_> = self
            .records
            .iter()
            .map(|r| (r, cosine_similarity(embedding, &r.embedding)))
            .filter(|(_, score)| *score >= threshold)
            .collect();
        scored.sort_by(|(a, sa), (b, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    /// Fails if `found` differs from an established dimension.
    pub fn check_dimension(&self, found: usize) -> Result<(), IndexError> {
        if self.dimension != 0 && found != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                found,
            });
        }
        Ok(())
    }
}

/// Cosine similarity of two vectors. Zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
