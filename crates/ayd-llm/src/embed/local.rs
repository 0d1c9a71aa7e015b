//! Local ONNX embeddings through fastembed.

use std::path::Path;

use ayd_config::EmbeddingConfig;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::info;

use super::Embedder;
use crate::LlmError;

/// Runs a fastembed model on the CPU. Model files are downloaded into the
/// cache directory on first use.
pub struct FastEmbedder {
    /// Loaded model.
    model: TextEmbedding,
    /// Model name as configured.
    name: String,
    /// Texts per inference batch.
    batch_size: usize,
}

impl FastEmbedder {
    /// Loads the model named by `config.model`.
    pub fn new(config: &EmbeddingConfig, cache_dir: &Path) -> Result<Self, LlmError> {
        let model = find_model(&config.model)?;
        info!(model = %config.model, cache = %cache_dir.display(), "loading local embedding model");
        let options = InitOptions::new(model)
            .with_cache_dir(cache_dir.join("models"))
            .with_max_length(config.max_length)
            .with_show_download_progress(true);
        let model = TextEmbedding::try_new(options).map_err(|e| LlmError::Embedding {
            message: e.to_string(),
        })?;
        Ok(Self {
            model,
            name: config.model.clone(),
            batch_size: config.batch_size,
        })
    }
}

impl Embedder for FastEmbedder {
    fn model_id(&self) -> String {
        self.name.clone()
    }

    fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        self.model
            .embed(texts.to_vec(), Some(self.batch_size))
            .map_err(|e| LlmError::Embedding {
                message: e.to_string(),
            })
    }
}

/// Looks up a fastembed model by its Hugging Face name, case-insensitively.
fn find_model(name: &str) -> Result<EmbeddingModel, LlmError> {
    let supported = TextEmbedding::list_supported_models();
    supported
        .iter()
        .find(|info| info.model_code.eq_ignore_ascii_case(name))
        .map(|info| info.model.clone())
        .ok_or_else(|| LlmError::UnknownModel {
            model: name.to_string(),
            supported: supported
                .iter()
                .map(|info| info.model_code.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_known_models() {
        assert!(find_model("BAAI/bge-small-en-v1.5").is_ok());
        assert!(find_model("sentence-transformers/all-MiniLM-L6-v2").is_ok());
    }

    #[test]
    fn test_unknown_model_lists_supported() {
        let err = find_model("not/a-model").unwrap_err();
        assert!(err.to_string().contains("BAAI/bge-small-en-v1.5"));
    }
}
