//! Embedding providers.

mod hash;
#[cfg(feature = "fastembed")]
mod local;
mod remote;

use std::path::Path;

use ayd_config::{EmbeddingConfig, EmbeddingProvider};
pub use hash::{HASH_DIMENSION, HashEmbedder};
#[cfg(feature = "fastembed")]
pub use local::FastEmbedder;
pub use remote::{OllamaEmbedder, OpenAiEmbedder};
use tracing::debug;

use crate::LlmError;

/// Turns text into fixed-length vectors.
pub trait Embedder: Send {
    /// Identifier of the model producing the vectors, stored with the collection.
    fn model_id(&self) -> String;

    /// Embeds `texts`, returning one vector per input in order.
    fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
}

/// Embeds `texts` in batches of `batch_size`, calling `on_batch(done, total)`
/// after each batch. Vectors are L2-normalised.
pub fn embed_batched(
    embedder: &mut dyn Embedder,
    texts: &[String],
    batch_size: usize,
    mut on_batch: impl FnMut(usize, usize),
) -> Result<Vec<Vec<f32>>, LlmError> {
    let batch_size = batch_size.max(1);
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size) {
        let embedded = embedder.embed(batch)?;
        if embedded.len() != batch.len() {
            return Err(LlmError::InvalidResponse {
                provider: "embedder",
                message: format!("expected {} vectors, got {}", batch.len(), embedded.len()),
            });
        }
        vectors.extend(embedded.into_iter().map(normalize));
        on_batch(vectors.len(), texts.len());
    }
    debug!(count = vectors.len(), model = %embedder.model_id(), "embedded texts");
    Ok(vectors)
}

/// Scales `v` to unit length. The zero vector is returned unchanged.
pub fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// Builds the embedder selected by `config`. `cache_dir` holds downloaded models.
pub fn create_embedder(
    config: &EmbeddingConfig,
    cache_dir: &Path,
) -> Result<Box<dyn Embedder>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "creating embedder");
    match config.provider {
        EmbeddingProvider::Hash => Ok(Box::new(HashEmbedder::new())),
        EmbeddingProvider::Ollama => Ok(Box::new(OllamaEmbedder::new(config)?)),
        EmbeddingProvider::OpenAi => Ok(Box::new(OpenAiEmbedder::new(config)?)),
        EmbeddingProvider::HuggingFace => huggingface(config, cache_dir),
    }
}

/// Local ONNX embeddings.
#[cfg(feature = "fastembed")]
fn huggingface(config: &EmbeddingConfig, cache_dir: &Path) -> Result<Box<dyn Embedder>, LlmError> {
    Ok(Box::new(FastEmbedder::new(config, cache_dir)?))
}

/// Reports that local embeddings were not compiled in.
#[cfg(not(feature = "fastembed"))]
fn huggingface(config: &EmbeddingConfig, _cache_dir: &Path) -> Result<Box<dyn Embedder>, LlmError> {
    Err(LlmError::ProviderUnavailable {
        provider: config.provider.to_string(),
        hint: "rebuild with '--features fastembed', or set embedding.provider to ollama, openai or hash"
            .into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns the text length as a one-dimensional vector.
    struct LengthEmbedder {
        calls: usize,
    }

    impl Embedder for LengthEmbedder {
        fn model_id(&self) -> String {
            "length".into()
        }

        fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            self.calls += 1;
            Ok(texts.iter().map(|t| vec![t.len() as f32, 0.0]).collect())
        }
    }

    #[test]
    fn test_embed_batched_reports_progress() {
        let texts: Vec<String> = (1..=5).map(|n| "x".repeat(n)).collect();
        let mut embedder = LengthEmbedder { calls: 0 };
        let mut progress = Vec::new();

        let vectors = embed_batched(&mut embedder, &texts, 2, |done, total| {
            progress.push((done, total));
        })
        .unwrap();

        assert_eq!(vectors.len(), 5);
        assert_eq!(embedder.calls, 3);
        assert_eq!(progress, vec![(2, 5), (4, 5), (5, 5)]);
        assert!(vectors.iter().all(|v| (v[0] - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_normalize() {
        let v = normalize(vec![3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert_eq!(normalize(vec![0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_create_hash_embedder() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::Hash,
            ..EmbeddingConfig::default()
        };
        let embedder = create_embedder(&config, Path::new("/tmp")).unwrap();
        assert_eq!(embedder.model_id(), format!("hash-{HASH_DIMENSION}"));
    }

    #[cfg(not(feature = "fastembed"))]
    #[test]
    fn test_huggingface_without_feature() {
        let err = create_embedder(&EmbeddingConfig::default(), Path::new("/tmp")).err().unwrap();
        assert!(matches!(err, LlmError::ProviderUnavailable { .. }));
        assert!(err.to_string().contains("huggingface"));
    }
}
