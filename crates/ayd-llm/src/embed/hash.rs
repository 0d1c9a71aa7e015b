//! Offline feature-hashing embedder.

use std::hash::Hasher;

use siphasher::sip::SipHasher24;

use super::{Embedder, normalize};
use crate::LlmError;

/// Vector dimension produced by [`HashEmbedder`].
pub const HASH_DIMENSION: usize = 384;

/// Deterministic bag-of-words embeddings.
///
/// Each lowercase alphanumeric token is hashed into one of [`HASH_DIMENSION`]
/// buckets with a hash-derived sign. Texts sharing vocabulary land close
/// together, which is enough for tests and for machines without a model.
#[derive(Debug, Clone, Default)]
pub struct HashEmbedder;

impl HashEmbedder {
    /// Creates the embedder.
    pub const fn new() -> Self {
        Self
    }

    /// Embeds a single text.
    pub fn embed_one(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; HASH_DIMENSION];
        for token in tokens(text) {
            let mut hasher = SipHasher24::new();
            hasher.write(token.as_bytes());
            let h = hasher.finish();
            let bucket = (h % HASH_DIMENSION as u64) as usize;
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        normalize(v)
    }
}

impl Embedder for HashEmbedder {
    fn model_id(&self) -> String {
        format!("hash-{HASH_DIMENSION}")
    }

    fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        Ok(texts.iter().map(|t| Self::embed_one(t)).collect())
    }
}

/// Lowercase alphanumeric tokens.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}
