//! Embeddings computed by an HTTP service.

use std::time::Duration;

use ayd_config::EmbeddingConfig;
use serde::Deserialize;
use serde_json::json;

use super::Embedder;
use crate::{LlmError, OPENAI_API_BASE, http::Endpoint};

/// Request timeout for embedding calls.
const EMBED_TIMEOUT: Duration = Duration::from_secs(120);

/// Embeddings from a local Ollama server (`/api/embed`).
#[derive(Debug)]
pub struct OllamaEmbedder {
    /// Server endpoint.
    endpoint: Endpoint,
    /// Embedding model name.
    model: String,
}

/// Response body of `/api/embed`.
#[derive(Deserialize)]
struct OllamaEmbedResponse {
    /// One vector per input.
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    /// Creates an embedder talking to `config.base_url`.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: Endpoint::new("ollama", &config.base_url, EMBED_TIMEOUT)?,
            model: config.model.clone(),
        })
    }
}

impl Embedder for OllamaEmbedder {
    fn model_id(&self) -> String {
        format!("ollama/{}", self.model)
    }

    fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let body = json!({ "model": self.model, "input": texts });
        let response: OllamaEmbedResponse = self
            .endpoint
            .post_json("/api/embed", &body)
            .map_err(|e| match e {
                LlmError::Api { status: 404, .. } => LlmError::ModelNotFound {
                    model: self.model.clone(),
                },
                e => e,
            })?;
        Ok(response.embeddings)
    }
}

/// Embeddings from the OpenAI `/embeddings` API or a compatible server.
#[derive(Debug)]
pub struct OpenAiEmbedder {
    /// API endpoint with bearer auth.
    endpoint: Endpoint,
    /// Embedding model name.
    model: String,
}

/// Response body of `/embeddings`.
#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    /// One entry per input.
    data: Vec<OpenAiEmbedding>,
}

/// A single embedding in an OpenAI response.
#[derive(Deserialize)]
struct OpenAiEmbedding {
    /// Position of the input this vector belongs to.
    #[serde(default)]
    index: usize,
    /// The vector.
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// Creates an embedder. Fails when no API key is configured.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, LlmError> {
        let key = config.resolved_api_key().ok_or(LlmError::MissingApiKey {
            provider: "openai",
            config_key: "embedding.api_key",
            env_var: "OPENAI_API_KEY",
        })?;
        let base = config.api_base.as_deref().unwrap_or(OPENAI_API_BASE);
        let endpoint = Endpoint::new("openai", base, EMBED_TIMEOUT)?
            .with_header("authorization", format!("Bearer {key}"))
            .with_key_hint("embedding.api_key or OPENAI_API_KEY");
        Ok(Self {
            endpoint,
            model: config.model.clone(),
        })
    }
}

impl Embedder for OpenAiEmbedder {
    fn model_id(&self) -> String {
        format!("openai/{}", self.model)
    }

    fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let body = json!({ "model": self.model, "input": texts });
        let mut response: OpenAiEmbedResponse = self.endpoint.post_json("/embeddings", &body)?;
        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use ayd_config::EmbeddingProvider;

    use super::*;

    #[test]
    fn test_openai_requires_key() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::OpenAi,
            api_key: Some(String::new()),
            ..EmbeddingConfig::default()
        };
        // A blank key counts as unset, so the result depends on OPENAI_API_KEY.
        if env::var_os("OPENAI_API_KEY").is_none() {
            assert!(matches!(
                OpenAiEmbedder::new(&config),
                Err(LlmError::MissingApiKey { env_var: "OPENAI_API_KEY", .. })
            ));
        }
    }

    #[test]
    fn test_model_ids() {
        let mut config = EmbeddingConfig {
            model: "nomic-embed-text".into(),
            ..EmbeddingConfig::default()
        };
        assert_eq!(
            OllamaEmbedder::new(&config).unwrap().model_id(),
            "ollama/nomic-embed-text"
        );
        config.api_key = Some("sk-test".into());
        config.model = "text-embedding-3-small".into();
        config.provider = EmbeddingProvider::OpenAi;
        assert_eq!(
            OpenAiEmbedder::new(&config).unwrap().model_id(),
            "openai/text-embedding-3-small"
        );
    }

    #[test]
    fn test_decode_openai_response_in_index_order() {
        let mut response: OpenAiEmbedResponse = serde_json::from_str(
            r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#,
        )
        .unwrap();
        response.data.sort_by_key(|d| d.index);
        assert_eq!(response.data[0].embedding, vec![1.0, 0.0]);
    }
}
