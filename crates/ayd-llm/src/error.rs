//! Error types for provider calls.

use thiserror::Error;

/// Errors raised by embedding and language-model providers.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider could not be reached.
    #[error("cannot connect to {provider} at {url}")]
    Connection {
        /// Provider name.
        provider: &'static str,
        /// Endpoint that was contacted.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request did not complete within the configured timeout.
    #[error("request to {provider} at {url} timed out")]
    Timeout {
        /// Provider name.
        provider: &'static str,
        /// Endpoint that was contacted.
        url: String,
    },

    /// The provider rejected the credentials (HTTP 401/403).
    #[error("{provider} rejected the API key; check {key_hint}")]
    Authentication {
        /// Provider name.
        provider: &'static str,
        /// Config key or environment variable that supplies the key.
        key_hint: String,
    },

    /// A provider that needs an API key has none configured.
    #[error("no API key configured for {provider}; set {config_key} or {env_var}")]
    MissingApiKey {
        /// Provider name.
        provider: &'static str,
        /// Config key that holds the API key.
        config_key: &'static str,
        /// Environment variable consulted as a fallback.
        env_var: &'static str,
    },

    /// Ollama does not have the requested model.
    #[error("model '{model}' is not available in Ollama; run 'ollama pull {model}'")]
    ModelNotFound {
        /// Model name.
        model: String,
    },

    /// The provider answered with an unexpected HTTP status.
    #[error("{provider} returned HTTP {status}: {body}")]
    Api {
        /// Provider name.
        provider: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The provider answered, but not in the expected shape.
    #[error("unexpected response from {provider}: {message}")]
    InvalidResponse {
        /// Provider name.
        provider: &'static str,
        /// What was wrong.
        message: String,
    },

    /// The configured provider is not compiled into this build.
    #[error("embedding provider '{provider}' is unavailable: {hint}")]
    ProviderUnavailable {
        /// Provider name.
        provider: String,
        /// How to fix it.
        hint: String,
    },

    /// The local embedding backend does not know the model.
    #[error("unknown embedding model '{model}'; supported: {supported}")]
    UnknownModel {
        /// Requested model.
        model: String,
        /// Comma-separated supported models.
        supported: String,
    },

    /// The local embedding backend failed.
    #[error("embedding failed: {message}")]
    Embedding {
        /// Backend error text.
        message: String,
    },

    /// Any other HTTP client failure.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),
}

impl LlmError {
    /// Returns a one-line suggestion for fixing the error, when there is one.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Connection { provider, url, .. } if *provider == "ollama" => {
                Some(format!("is Ollama running at {url}? Start it with 'ollama serve'"))
            }
            Self::Connection { .. } | Self::Timeout { .. } => {
                Some("check your network connection and the configured base URL".into())
            }
            Self::ModelNotFound { .. } => Some("list local models with 'ollama list'".into()),
            _ => None,
        }
    }
}
