//! Language-model providers.

mod anthropic;
mod ollama;
mod openai;

use ayd_config::{LlmProvider, ModelConfig};
pub use anthropic::AnthropicClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
use tracing::debug;

use crate::LlmError;

/// A system instruction plus the user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Instructions for the model.
    pub system: String,
    /// The user message: retrieved context and the question.
    pub user: String,
}

/// Generates text from a prompt.
pub trait LanguageModel: Send {
    /// Model name for display.
    fn name(&self) -> &str;

    /// Returns the full completion.
    fn complete(&self, prompt: &Prompt) -> Result<String, LlmError>;

    /// Streams the completion, calling `on_token` for each fragment, and returns
    /// the concatenated text.
    fn complete_streaming(
        &self,
        prompt: &Prompt,
        on_token: &mut dyn FnMut(&str),
    ) -> Result<String, LlmError>;
}

/// Builds the client selected by `config.provider`.
pub fn create_language_model(config: &ModelConfig) -> Result<Box<dyn LanguageModel>, LlmError> {
    debug!(provider = %config.provider, model = %config.name, "creating language model");
    Ok(match config.provider {
        LlmProvider::Ollama => Box::new(OllamaClient::new(config)?),
        LlmProvider::OpenAi => Box::new(OpenAiClient::new(config)?),
        LlmProvider::Anthropic => Box::new(AnthropicClient::new(config)?),
    })
}

/// Returns the API key for a hosted provider or [`LlmError::MissingApiKey`].
fn require_api_key(config: &ModelConfig, provider: &'static str) -> Result<String, LlmError> {
    config.resolved_api_key().ok_or(LlmError::MissingApiKey {
        provider,
        config_key: "model.api_key",
        env_var: config.provider.api_key_env().unwrap_or_default(),
    })
}

/// Hint naming where a provider's key is configured.
fn key_hint(config: &ModelConfig) -> String {
    match config.provider.api_key_env() {
        Some(env_var) => format!("model.api_key or {env_var}"),
        None => "model.api_key".into(),
    }
}
