//! Shared context for running CLI commands.

use std::{
    env,
    io::{self, IsTerminal},
    path::{Path, PathBuf},
    process::ExitCode,
};

use ayd_config::{Config, ConfigManager};
use ayd_highlight::Palette;
use ayd_index::{DocumentIngestor, VectorStoreManager};
use ayd_llm::{
    Embedder, LanguageModel, LlmError, Prompt, create_embedder, create_language_model,
};
use ayd_query::QueryEngine;

use crate::cli::{args::Cli, output::print_error};

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// Current working directory.
    pub cwd: PathBuf,
    /// Configuration file locations.
    pub manager: ConfigManager,
    /// Effective configuration for `cwd`.
    pub config: Config,
    /// Output styles.
    pub palette: Palette,
}

impl CommandContext {
    /// Resolves directories and loads the effective configuration.
    pub fn load(cli: &Cli) -> Result<Self, ExitCode> {
        let mut ctx = Self::load_without_config(cli)?;
        ctx.config = ctx
            .manager
            .load_effective(&ctx.cwd)
            .map_err(|e| {
                print_error(
                    &format!("failed to load configuration: {e}"),
                    Some("fix the file or run 'askyourdocs config reset'".to_string()),
                )
            })?;
        Ok(ctx)
    }

    /// Resolves directories only, leaving the default configuration in place.
    ///
    /// Used by `config reset` and `config path`, which must work even when the
    /// existing file is invalid.
    pub fn load_without_config(cli: &Cli) -> Result<Self, ExitCode> {
        let cwd = env::current_dir()
            .map_err(|e| print_error(&format!("could not determine current directory: {e}"), None))?;
        let manager = match &cli.config {
            Some(path) => ConfigManager::with_config_file(path),
            None => ConfigManager::new(),
        }
        .map_err(|e| print_error(&e, None))?;
        Ok(Self {
            cwd,
            manager,
            config: Config::default(),
            palette: Palette::new(color_enabled(cli.no_color)),
        })
    }

    /// Opens the configured collection.
    pub fn store(&self) -> Result<VectorStoreManager, ExitCode> {
        VectorStoreManager::new(&self.config, &self.cwd, &self.manager.data_dir)
            .map_err(|e| print_error(&e, e.hint()))
    }

    /// Creates the configured embedding backend.
    pub fn embedder(&self) -> Result<Box<dyn Embedder>, ExitCode> {
        let cache_dir = self.manager.cache_dir.join("models");
        create_embedder(&self.config.embedding, &cache_dir).map_err(|e| print_error(&e, e.hint()))
    }

    /// Creates an ingestor over the configured collection.
    pub fn ingestor(&self) -> Result<DocumentIngestor, ExitCode> {
        Ok(DocumentIngestor::new(&self.config, self.store()?, self.embedder()?))
    }

    /// Creates a query engine, optionally with a different language model.
    pub fn engine(&self, model: Option<&str>) -> Result<QueryEngine, ExitCode> {
        let mut model_config = self.config.model.clone();
        if let Some(name) = model {
            model_config.name = name.to_string();
        }
        let llm = create_language_model(&model_config).map_err(|e| print_error(&e, e.hint()))?;
        Ok(QueryEngine::new(&self.config, self.store()?, self.embedder()?, llm))
    }

    /// Creates a query engine that never calls a language model.
    ///
    /// `search` and `similar` only need retrieval, so they work without a
    /// reachable model server or API key.
    pub fn retrieval_engine(&self) -> Result<QueryEngine, ExitCode> {
        Ok(QueryEngine::new(
            &self.config,
            self.store()?,
            self.embedder()?,
            Box::new(NoModel),
        ))
    }

    /// Formats `path` relative to the working directory when it lies below it.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.cwd)
            .map_or_else(|_| path.display().to_string(), |p| p.display().to_string())
    }
}

/// Returns true if stdout is a terminal and color was not turned off.
fn color_enabled(no_color: bool) -> bool {
    !no_color && env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal()
}

/// Stand-in language model for retrieval-only commands.
struct NoModel;

impl LanguageModel for NoModel {
    fn name(&self) -> &str {
        "none"
    }

    fn complete(&self, _prompt: &Prompt) -> Result<String, LlmError> {
        Err(LlmError::InvalidResponse {
            provider: "none",
            message: "this command does not generate answers".into(),
        })
    }

    fn complete_streaming(
        &self,
        prompt: &Prompt,
        _on_token: &mut dyn FnMut(&str),
    ) -> Result<String, LlmError> {
        self.complete(prompt)
    }
}
