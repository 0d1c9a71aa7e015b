//! Embedding and language-model providers for AskYourDocs.
//!
//! Two traits sit at the seam between retrieval and the outside world:
//! [`Embedder`] turns text into vectors and [`LanguageModel`] turns a prompt
//! into an answer. Providers talk to Ollama, OpenAI, or Anthropic over blocking
//! HTTP; the `hash` embedder and the optional `fastembed` backend run offline.

#![warn(missing_docs)]

mod chat;
mod embed;
mod error;
mod http;

pub use chat::{
    AnthropicClient, LanguageModel, OllamaClient, OpenAiClient, Prompt, create_language_model,
};
#[cfg(feature = "fastembed")]
pub use embed::FastEmbedder;
pub use embed::{
    Embedder, HASH_DIMENSION, HashEmbedder, OllamaEmbedder, OpenAiEmbedder, create_embedder,
    embed_batched, normalize,
};
pub use error::LlmError;

/// Default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Default Anthropic API base URL.
pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
