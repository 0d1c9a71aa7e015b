//! Configuration system for AskYourDocs.
//!
//! AskYourDocs keeps a global YAML file, `config.yaml`, in the platform configuration
//! directory. It is created with defaults the first time it is loaded. Projects can
//! override any value with `.askyourdocs.yaml` files, which are discovered by walking up
//! from the current working directory and merged over the global file, closest first.

#![warn(missing_docs)]

mod discovery;
mod error;
mod manager;
mod merge;
mod patterns;
mod resolve;
#[cfg(test)]
mod test_support;
mod validate;

use std::{
    env, fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

pub use discovery::{CONFIG_FILENAME, discover_config_files, is_root_config};
pub use error::ConfigError;
pub use manager::{ConfigManager, GLOBAL_CONFIG_FILENAME, format_value};
pub use merge::deep_merge;
pub use patterns::FilePatterns;
pub use resolve::{expand_tilde, resolve_storage_path};
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, DurationSecondsWithFrac, OneOrMany, serde_as};
use serde_yaml::Value;
pub use validate::{
    MAX_CHUNK_SIZE, MAX_TOP_K, MIN_CHUNK_SIZE, ValidationIssue, validate_chunk_size,
    validate_config, validate_similarity_threshold, validate_top_k,
};

/// Fully resolved configuration for AskYourDocs.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Language model used to generate answers.
    pub model: ModelConfig,
    /// Embedding model used for vector search.
    pub embedding: EmbeddingConfig,
    /// How documents are split before embedding.
    pub chunking: ChunkingConfig,
    /// How context is retrieved for a question.
    pub retrieval: RetrievalConfig,
    /// Where the document collection lives.
    pub storage: StorageConfig,
    /// Which files are ingested.
    pub ingestion: IngestionConfig,
    /// Terminal output preferences.
    pub ui: UiConfig,
    /// Files this configuration was loaded from, highest precedence first.
    #[serde(skip)]
    pub sources: Vec<PathBuf>,
}

impl Config {
    /// Builds a configuration from a YAML value, filling gaps with defaults.
    ///
    /// A null value (empty file) yields the default configuration. The result is
    /// validated; any problem is returned as [`ConfigError::Invalid`].
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let config: Self = if value.is_null() {
            Self::default()
        } else {
            serde_yaml::from_value(value).map_err(|source| ConfigError::Deserialize { source })?
        };
        config.check()?;
        Ok(config)
    }

    /// Parses and validates a YAML document. `path` is only used for error messages.
    pub fn from_yaml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let value = parse_yaml(content, path)?;
        Self::from_value(value)
    }

    /// Loads the configuration in effect for `cwd`.
    ///
    /// With `explicit` only that file is read. Otherwise the global file and any
    /// project files above `cwd` are merged, closest first.
    pub fn load(cwd: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let manager = match explicit {
            Some(path) => ConfigManager::with_config_file(path)?,
            None => ConfigManager::new()?,
        };
        manager.load_effective(cwd)
    }

    /// Returns every validation problem in this configuration.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        validate_config(self)
    }

    /// Fails with [`ConfigError::Invalid`] if validation finds any problem.
    pub fn check(&self) -> Result<(), ConfigError> {
        let issues = self.validate();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid { issues })
        }
    }

    /// Serializes the effective configuration to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|source| ConfigError::Deserialize { source })
    }

    /// Serializes the configuration to a YAML value tree.
    pub fn to_value(&self) -> Result<Value, ConfigError> {
        serde_yaml::to_value(self).map_err(|source| ConfigError::Deserialize { source })
    }

    /// Returns the value at a dotted key such as `model.temperature`.
    pub fn get_value(&self, key: &str) -> Result<Value, ConfigError> {
        // Round-trip through YAML text so floats print as written, not widened.
        let value = parse_yaml(&self.to_yaml()?, Path::new("<effective config>"))?;
        merge::get_path(&value, key)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownKey {
                key: key.to_string(),
            })
    }

    /// Compiles the ingestion include/exclude patterns.
    pub fn compile_patterns(&self) -> Result<FilePatterns, ConfigError> {
        FilePatterns::compile(
            &self.ingestion.include_patterns,
            &self.ingestion.exclude_patterns,
        )
    }
}

/// Parses YAML text into a value, treating an empty document as null.
pub(crate) fn parse_yaml(content: &str, path: &Path) -> Result<Value, ConfigError> {
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Declares a lowercase string enum with serde, `Display` and `FromStr` support.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// All accepted values, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the configuration spelling of this value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lower = s.trim().to_ascii_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == lower)
                    .ok_or_else(|| {
                        let expected: Vec<_> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        format!("'{s}' is not one of: {}", expected.join(", "))
                    })
            }
        }
    };
}

string_enum! {
    /// Backend that generates answers.
    LlmProvider {
        /// Local Ollama server.
        Ollama => "ollama",
        /// OpenAI-compatible chat completions API.
        OpenAi => "openai",
        /// Anthropic messages API.
        Anthropic => "anthropic",
    }
}

impl LlmProvider {
    /// Environment variable consulted when no API key is configured.
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::Ollama => None,
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
        }
    }
}

string_enum! {
    /// Backend that turns text into vectors.
    EmbeddingProvider {
        /// Local ONNX model from the HuggingFace hub.
        HuggingFace => "huggingface",
        /// Ollama embedding endpoint.
        Ollama => "ollama",
        /// OpenAI embeddings API.
        OpenAi => "openai",
        /// Offline feature-hashing embedder.
        Hash => "hash",
    }
}

string_enum! {
    /// Compute device requested for local embedding models.
    Device {
        /// Run on the CPU.
        Cpu => "cpu",
        /// NVIDIA GPU.
        Cuda => "cuda",
        /// Apple Metal.
        Mps => "mps",
        /// Pick automatically.
        Auto => "auto",
    }
}

string_enum! {
    /// Strategy used to split documents into chunks.
    ChunkStrategy {
        /// Pack whole sentences.
        Sentence => "sentence",
        /// Split on progressively finer separators.
        Recursive => "recursive",
        /// Fixed-size character windows.
        Fixed => "fixed",
        /// Split at markdown headings.
        Markdown => "markdown",
    }
}

string_enum! {
    /// How context is retrieved for a question.
    RetrievalMode {
        /// Embedding similarity only.
        Vector => "vector",
        /// BM25 keyword matching only.
        Keyword => "keyword",
        /// Both, fused by reciprocal rank.
        Hybrid => "hybrid",
    }
}

/// Language model settings.
#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Which backend to call.
    pub provider: LlmProvider,
    /// Model name as known to the provider.
    pub name: String,
    /// Base URL of the Ollama server.
    pub base_url: String,
    /// API key for hosted providers. Falls back to the provider's environment variable.
    pub api_key: Option<String>,
    /// Override for the hosted provider's API base URL.
    pub api_base: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Request timeout.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
}

impl ModelConfig {
    /// Returns the configured API key, or the provider's environment variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref(), self.provider.api_key_env())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Ollama,
            name: String::from("tinyllama:1.1b"),
            base_url: String::from("http://localhost:11434"),
            api_key: None,
            api_base: None,
            temperature: 0.1,
            max_tokens: 2048,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which backend computes embeddings.
    pub provider: EmbeddingProvider,
    /// Model name.
    pub model: String,
    /// Compute device for local models.
    pub device: Device,
    /// Texts per embedding request.
    pub batch_size: usize,
    /// Maximum input length in tokens.
    pub max_length: usize,
    /// Base URL of the Ollama server, for the `ollama` provider.
    pub base_url: String,
    /// API key for the `openai` provider. Falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Override for the OpenAI API base URL.
    pub api_base: Option<String>,
}

impl EmbeddingConfig {
    /// Returns the configured API key, or `OPENAI_API_KEY` for the `openai` provider.
    pub fn resolved_api_key(&self) -> Option<String> {
        let env_var = match self.provider {
            EmbeddingProvider::OpenAi => Some("OPENAI_API_KEY"),
            _ => None,
        };
        resolve_api_key(self.api_key.as_deref(), env_var)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::HuggingFace,
            model: String::from("BAAI/bge-small-en-v1.5"),
            device: Device::Cpu,
            batch_size: 32,
            max_length: 512,
            base_url: String::from("http://localhost:11434"),
            api_key: None,
            api_base: None,
        }
    }
}

/// Chunking settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Splitting strategy.
    pub strategy: ChunkStrategy,
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Avoid cutting words when windows are fixed-size.
    pub respect_boundaries: bool,
    /// Trailing chunks smaller than this are merged into their predecessor.
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::Sentence,
            chunk_size: 1000,
            chunk_overlap: 200,
            respect_boundaries: true,
            min_chunk_size: 100,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the model.
    pub top_k: usize,
    /// Minimum cosine similarity for vector matches.
    pub similarity_threshold: f32,
    /// How chunks are retrieved.
    pub retrieval_mode: RetrievalMode,
    /// Maximum characters of context placed in the prompt.
    pub max_context_length: usize,
    /// Stemming language for the keyword index.
    pub stemmer: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            similarity_threshold: 0.7,
            retrieval_mode: RetrievalMode::Hybrid,
            max_context_length: 4000,
            stemmer: String::from("english"),
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage directory. Relative paths resolve against the working directory;
    /// unset means `storage` under the data directory.
    pub path: Option<String>,
    /// Name of the collection inside the storage directory.
    pub collection_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            collection_name: String::from("documents"),
        }
    }
}

impl StorageConfig {
    /// Resolves the storage directory for a working directory. See [`resolve_storage_path`].
    pub fn resolve_path(&self, cwd: &Path, data_dir: &Path) -> Result<PathBuf, ConfigError> {
        resolve_storage_path(self.path.as_deref(), cwd, data_dir)
    }
}

/// Ingestion settings.
#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Glob patterns a file must match to be ingested. Empty means everything.
    #[serde_as(as = "OneOrMany<_>")]
    pub include_patterns: Vec<String>,
    /// Glob patterns that exclude a file.
    #[serde_as(as = "OneOrMany<_>")]
    pub exclude_patterns: Vec<String>,
    /// Files larger than this are skipped.
    pub max_file_size_mb: u64,
    /// Quiet period before changes seen by `--watch` are ingested.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub watch_debounce: Duration,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            max_file_size_mb: 50,
            watch_debounce: Duration::from_secs(2),
        }
    }
}

/// Terminal output settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    /// Print the sources after each answer.
    pub show_sources: bool,
    /// Stream answer tokens as they arrive.
    pub streaming: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_sources: true,
            streaming: true,
        }
    }
}

/// Returns a non-empty configured key, or the value of `env_var`.
fn resolve_api_key(configured: Option<&str>, env_var: Option<&str>) -> Option<String> {
    configured
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .or_else(|| {
            env_var
                .and_then(|name| env::var(name).ok())
                .filter(|k| !k.trim().is_empty())
        })
}
