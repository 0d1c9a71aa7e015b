//! Global configuration file management.
//!
//! [`ConfigManager`] owns the platform directories used by AskYourDocs and the
//! global `config.yaml`. It creates the file with defaults on first use, merges
//! project overrides over it, and edits single values for `config set`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use serde_yaml::Value;
use tracing::{debug, info};

use crate::{
    CONFIG_FILENAME, Config, ConfigError,
    discovery::{discover_config_files, is_root_config},
    merge::{deep_merge, get_path, set_path},
    parse_yaml,
};

/// File name of the global configuration inside the config directory.
pub const GLOBAL_CONFIG_FILENAME: &str = "config.yaml";

/// Header written at the top of generated configuration files.
const FILE_HEADER: &str = "# AskYourDocs configuration\n";

/// Locates, creates, and edits AskYourDocs configuration files.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// Directory holding the global configuration.
    pub config_dir: PathBuf,
    /// Global configuration file.
    pub config_file: PathBuf,
    /// Directory for persistent data such as the default storage location.
    pub data_dir: PathBuf,
    /// Directory for downloaded models and other caches.
    pub cache_dir: PathBuf,
    /// Whether `.askyourdocs.yaml` files are merged over the global file.
    discover_local: bool,
}

impl ConfigManager {
    /// Uses the platform directories for AskYourDocs.
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = project_dirs()?;
        Ok(Self {
            config_dir: dirs.config_dir().to_path_buf(),
            config_file: dirs.config_dir().join(GLOBAL_CONFIG_FILENAME),
            data_dir: dirs.data_dir().to_path_buf(),
            cache_dir: dirs.cache_dir().to_path_buf(),
            discover_local: true,
        })
    }

    /// Uses explicit configuration and data directories.
    pub fn with_dirs(config_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let data_dir = data_dir.into();
        Self {
            config_file: config_dir.join(GLOBAL_CONFIG_FILENAME),
            cache_dir: data_dir.join("cache"),
            config_dir,
            data_dir,
            discover_local: true,
        }
    }

    /// Uses a single explicit configuration file, skipping project discovery.
    ///
    /// Data and cache directories still come from the platform.
    pub fn with_config_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let config_file = path.into();
        let dirs = project_dirs()?;
        Ok(Self {
            config_dir: config_file
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
            config_file,
            data_dir: dirs.data_dir().to_path_buf(),
            cache_dir: dirs.cache_dir().to_path_buf(),
            discover_local: false,
        })
    }

    /// Loads the global configuration, writing the defaults first if the file is missing.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let value = self.read_global()?;
        let mut config = Config::from_value(value)?;
        config.sources = vec![self.config_file.clone()];
        Ok(config)
    }

    /// Loads the configuration in effect for `cwd`.
    ///
    /// Project files closer to `cwd` win. A project file with `root: true` also
    /// shuts out the global file.
    pub fn load_effective(&self, cwd: &Path) -> Result<Config, ConfigError> {
        let global = self.read_global()?;
        let locals = if self.discover_local {
            discover_config_files(cwd)
        } else {
            Vec::new()
        };
        let root_found = locals.last().is_some_and(|p| is_root_config(p));

        let mut merged = Config::default().to_value()?;
        let mut sources = locals.clone();
        if !root_found {
            deep_merge(&mut merged, global);
            sources.push(self.config_file.clone());
        }
        for path in locals.iter().rev() {
            debug!(path = %path.display(), "merging project config");
            deep_merge(&mut merged, read_value(path)?);
        }

        let mut config = Config::from_value(merged)?;
        config.sources = sources;
        Ok(config)
    }

    /// Returns the value of a dotted key from the global configuration.
    pub fn get_value(&self, key: &str) -> Result<Value, ConfigError> {
        self.load_config()?.get_value(key)
    }

    /// Sets a dotted key in the global configuration and saves it.
    ///
    /// `raw` is parsed as a YAML scalar, so `0.5` becomes a number and `false` a
    /// boolean. String-valued keys keep the raw text. The edited configuration
    /// must validate before anything is written.
    pub fn set_value(&self, key: &str, raw: &str) -> Result<Config, ConfigError> {
        let mut value = self.read_global()?;
        set_path(&mut value, key, parse_raw_value(key, raw)?);
        let mut config = Config::from_value(value.clone())?;
        write_value(&self.config_file, &value)?;
        info!(key, path = %self.config_file.display(), "updated configuration");
        config.sources = vec![self.config_file.clone()];
        Ok(config)
    }

    /// Sets a dotted key in `dir/.askyourdocs.yaml`, creating the file if needed.
    ///
    /// The configuration in effect for `dir` after the edit must validate.
    pub fn set_local_value(&self, dir: &Path, key: &str, raw: &str) -> Result<PathBuf, ConfigError> {
        let path = dir.join(CONFIG_FILENAME);
        let mut value = if path.is_file() {
            read_value(&path)?
        } else {
            Value::Null
        };
        set_path(&mut value, key, parse_raw_value(key, raw)?);

        let mut effective = Config::default().to_value()?;
        deep_merge(&mut effective, self.read_global()?);
        deep_merge(&mut effective, value.clone());
        Config::from_value(effective)?;

        write_value(&path, &value)?;
        info!(key, path = %path.display(), "updated project configuration");
        Ok(path)
    }

    /// Overwrites the global configuration with the defaults.
    pub fn reset(&self) -> Result<Config, ConfigError> {
        let config = Config::default();
        self.write_defaults()?;
        Ok(config)
    }

    /// Reads the global file as a value tree, creating it when missing.
    fn read_global(&self) -> Result<Value, ConfigError> {
        if !self.config_file.exists() {
            self.write_defaults()?;
        }
        read_value(&self.config_file)
    }

    /// Writes the default configuration to the global file.
    fn write_defaults(&self) -> Result<(), ConfigError> {
        write_yaml(&self.config_file, &Config::default().to_yaml()?)?;
        info!(path = %self.config_file.display(), "wrote default configuration");
        Ok(())
    }
}

/// Returns the platform directories for AskYourDocs.
fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("", "", "askyourdocs").ok_or(ConfigError::NoHomeDirectory)
}

/// Reads and parses a YAML file.
fn read_value(path: &Path) -> Result<Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_yaml(&content, path)
}

/// Writes a value tree as YAML.
fn write_value(path: &Path, value: &Value) -> Result<(), ConfigError> {
    let yaml = serde_yaml::to_string(value).map_err(|source| ConfigError::Deserialize { source })?;
    write_yaml(path, &yaml)
}

/// Writes YAML text after the file header, creating parent directories.
fn write_yaml(path: &Path, yaml: &str) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::WriteFile {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, format!("{FILE_HEADER}{yaml}")).map_err(write_err)
}

/// Parses a command-line value for `key`, using the default's type as a guide.
fn parse_raw_value(key: &str, raw: &str) -> Result<Value, ConfigError> {
    let defaults = Config::default().to_value()?;
    let Some(template) = get_path(&defaults, key) else {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
        });
    };
    let invalid = |message: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        message: message.to_string(),
    };

    if template.is_mapping() {
        return Err(invalid("is a section; set one of its keys instead"));
    }
    let trimmed = raw.trim();
    if trimmed == "null" || trimmed == "~" {
        return Ok(Value::Null);
    }
    if template.is_string() || template.is_null() {
        return Ok(Value::String(raw.to_string()));
    }
    if trimmed.is_empty() {
        return Err(invalid("value must not be empty"));
    }
    serde_yaml::from_str(trimmed).map_err(|e| invalid(&e.to_string()))
}

/// Renders a configuration value for display.
///
/// Strings print without quotes. Lists and sections print as YAML.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::from("null"),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkStrategy, LlmProvider, test_support::TestDir};

    fn manager(dir: &TestDir) -> ConfigManager {
        ConfigManager::with_dirs(dir.path().join("config"), dir.path().join("data"))
    }

    #[test]
    fn test_paths() {
        let dir = TestDir::new();
        let manager = manager(&dir);
        assert_eq!(manager.config_file, dir.path().join("config/config.yaml"));
        assert_eq!(manager.data_dir, dir.path().join("data"));
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = TestDir::new();
        let manager = manager(&dir);
        assert!(!manager.config_file.exists());

        let config = manager.load_config().unwrap();
        assert!(manager.config_file.exists());
        assert_eq!(config.model.provider, LlmProvider::Ollama);
        assert_eq!(config.model.name, "tinyllama:1.1b");
        assert_eq!(config.chunking.chunk_size, 1000);

        let content = fs::read_to_string(&manager.config_file).unwrap();
        assert!(content.starts_with(FILE_HEADER));
    }

    #[test]
    fn test_get_value() {
        let dir = TestDir::new();
        let manager = manager(&dir);
        let value = manager.get_value("model.temperature").unwrap();
        assert!((value.as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert!(matches!(
            manager.get_value("model.nope"),
            Err(ConfigError::UnknownKey { .. })
        ));
    }

    #[test]
    fn test_set_value_number_and_bool() {
        let dir = TestDir::new();
        let manager = manager(&dir);

        let config = manager.set_value("model.temperature", "0.5").unwrap();
        assert!((config.model.temperature - 0.5).abs() < f32::EPSILON);

        let config = manager.set_value("chunking.respect_boundaries", "false").unwrap();
        assert!(!config.chunking.respect_boundaries);

        let reloaded = manager.load_config().unwrap();
        assert!((reloaded.model.temperature - 0.5).abs() < f32::EPSILON);
        assert!(!reloaded.chunking.respect_boundaries);
    }

    #[test]
    fn test_set_value_string_keeps_text() {
        let dir = TestDir::new();
        let manager = manager(&dir);
        let config = manager.set_value("model.name", "1234").unwrap();
        assert_eq!(config.model.name, "1234");
        let config = manager.set_value("model.api_key", "sk-test").unwrap();
        assert_eq!(config.model.api_key.as_deref(), Some("sk-test"));
        let config = manager.set_value("model.api_key", "null").unwrap();
        assert!(config.model.api_key.is_none());
    }

    #[test]
    fn test_set_value_enum() {
        let dir = TestDir::new();
        let manager = manager(&dir);
        let config = manager.set_value("chunking.strategy", "markdown").unwrap();
        assert_eq!(config.chunking.strategy, ChunkStrategy::Markdown);
        assert!(manager.set_value("chunking.strategy", "invalid").is_err());
    }

    #[test]
    fn test_set_value_rejects_invalid_and_keeps_file() {
        let dir = TestDir::new();
        let manager = manager(&dir);
        manager.load_config().unwrap();
        let before = fs::read_to_string(&manager.config_file).unwrap();

        assert!(manager.set_value("model.max_tokens", "-1").is_err());
        assert!(manager.set_value("chunking.chunk_overlap", "1000").is_err());
        assert!(manager.set_value("retrieval.similarity_threshold", "1.5").is_err());
        assert!(manager.set_value("embedding.device", "invalid").is_err());
        assert!(matches!(
            manager.set_value("model", "x"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            manager.set_value("nope.key", "1"),
            Err(ConfigError::UnknownKey { .. })
        ));

        assert_eq!(fs::read_to_string(&manager.config_file).unwrap(), before);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let dir = TestDir::new();
        let manager = manager(&dir);
        manager.set_value("retrieval.top_k", "9").unwrap();
        manager.reset().unwrap();
        assert_eq!(manager.load_config().unwrap().retrieval.top_k, 5);
    }

    #[test]
    fn test_effective_merges_project_files() {
        let dir = TestDir::new();
        let manager = manager(&dir);
        manager.set_value("model.name", "global-model").unwrap();
        dir.create_config_with_content("proj", "retrieval:\n  top_k: 8\n");
        dir.create_config_with_content("proj/sub", "model:\n  name: local-model\n");
        let cwd = dir.create_dir("proj/sub/deeper");

        let config = manager.load_effective(&cwd).unwrap();
        assert_eq!(config.model.name, "local-model");
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.sources.last(), Some(&manager.config_file));
    }

    #[test]
    fn test_root_project_file_shuts_out_global() {
        let dir = TestDir::new();
        let manager = manager(&dir);
        manager.set_value("retrieval.top_k", "9").unwrap();
        dir.create_config_with_content("proj", "root: true\nmodel:\n  name: local\n");
        let cwd = dir.create_dir("proj");

        let config = manager.load_effective(&cwd).unwrap();
        assert_eq!(config.model.name, "local");
        assert_eq!(config.retrieval.top_k, 5);
        assert!(!config.sources.contains(&manager.config_file));
    }

    #[test]
    fn test_set_local_value() {
        let dir = TestDir::new();
        let manager = manager(&dir);
        let proj = dir.create_dir("proj");

        let path = manager.set_local_value(&proj, "retrieval.top_k", "3").unwrap();
        assert_eq!(path, proj.join(CONFIG_FILENAME));
        assert_eq!(manager.load_effective(&proj).unwrap().retrieval.top_k, 3);
        assert!(manager.set_local_value(&proj, "retrieval.top_k", "0").is_err());
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = TestDir::new();
        let manager = manager(&dir);
        fs::create_dir_all(&manager.config_dir).unwrap();
        fs::write(&manager.config_file, "model: [unclosed\n").unwrap();
        let err = manager.load_config().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&Value::from("abc")), "abc");
        assert_eq!(format_value(&Value::Null), "null");
        assert_eq!(format_value(&Value::from(5)), "5");
        assert_eq!(format_value(&Value::Bool(true)), "true");
    }
}
