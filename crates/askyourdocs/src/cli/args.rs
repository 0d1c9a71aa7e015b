//! Clap argument definitions for the `askyourdocs` CLI.

use std::path::PathBuf;

use ayd_config::RetrievalMode;
use clap::{ArgAction, Args, Parser, Subcommand};

/// Top-level CLI options.
#[derive(Parser, Debug)]
#[command(name = "AskYourDocs", bin_name = "askyourdocs")]
#[command(version = concat!("v", env!("CARGO_PKG_VERSION")))]
#[command(about = "Privacy-first, local-only document Q&A CLI tool")]
#[command(long_about = "Privacy-first, local-only document Q&A CLI tool.\n\n\
    Ingest a folder of documents, then ask questions about them. Everything is \
    stored on disk next to you; answers come from a local Ollama model unless a \
    remote provider is configured.")]
pub struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG takes precedence
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Use this configuration file instead of the global and project files
    #[arg(long, global = true, env = "ASKYOURDOCS_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments for `askyourdocs ingest`.
#[derive(Args, Debug, Clone)]
pub struct IngestCommand {
    /// Files or directories to ingest
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Only ingest files matching this glob (repeatable; replaces configured includes)
    #[arg(short = 'i', long = "include", value_name = "GLOB")]
    pub include: Vec<String>,

    /// Skip files matching this glob (repeatable)
    #[arg(short = 'e', long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Re-ingest files even if they have not changed
    #[arg(long)]
    pub force: bool,

    /// Keep running and re-ingest files as they change
    #[arg(long)]
    pub watch: bool,
}

/// Retrieval overrides shared by `ask` and `interactive`.
#[derive(Args, Debug, Clone, Default)]
pub struct RetrievalArgs {
    /// Number of chunks to retrieve [default: retrieval.top_k]
    #[arg(short = 'k', long, allow_negative_numbers = true)]
    pub top_k: Option<i64>,

    /// Retrieval mode: vector, keyword or hybrid [default: retrieval.retrieval_mode]
    #[arg(short = 'm', long)]
    pub mode: Option<RetrievalMode>,

    /// Minimum similarity for vector matches, 0.0-1.0 [default: retrieval.similarity_threshold]
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<f32>,
}

/// Arguments for `askyourdocs ask`.
#[derive(Args, Debug, Clone)]
pub struct AskCommand {
    /// The question
    #[arg(required = true)]
    pub question: Vec<String>,

    /// Retrieval overrides.
    #[command(flatten)]
    pub retrieval: RetrievalArgs,

    /// Language model to use instead of model.name
    #[arg(long)]
    pub model: Option<String>,

    /// Print the answer only once it is complete
    #[arg(long)]
    pub no_stream: bool,

    /// Do not list the source documents
    #[arg(long)]
    pub no_sources: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `askyourdocs search` and `askyourdocs similar`.
#[derive(Args, Debug, Clone)]
pub struct SearchCommand {
    /// Search text
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Maximum results
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `askyourdocs interactive`.
#[derive(Args, Debug, Clone)]
pub struct InteractiveCommand {
    /// Retrieval overrides.
    #[command(flatten)]
    pub retrieval: RetrievalArgs,

    /// Language model to use instead of model.name
    #[arg(long)]
    pub model: Option<String>,
}

/// Arguments for `askyourdocs refresh`.
#[derive(Args, Debug, Clone, Copy)]
pub struct RefreshCommand {
    /// Delete the collection and re-embed everything
    #[arg(long)]
    pub full: bool,
}

/// Arguments for commands that ask before destroying data.
#[derive(Args, Debug, Clone, Copy)]
pub struct ConfirmArgs {
    /// Do not ask for confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// `askyourdocs config` actions.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print one value, e.g. `model.name`
    Get {
        /// Dotted key
        key: String,
    },
    /// Change one value
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
        /// Write to ./.askyourdocs.yaml instead of the global file
        #[arg(long)]
        local: bool,
    },
    /// Restore the default global configuration
    Reset(ConfirmArgs),
    /// Print configuration file locations
    Path,
    /// Check the effective configuration
    Validate,
}

/// Supported `askyourdocs` subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add documents to the collection
    #[command(after_help = "\
EXAMPLES:
  askyourdocs ingest ./docs
  askyourdocs ingest ./docs --include '**/*.pdf' --exclude 'drafts/**'
  askyourdocs ingest ./notes --watch")]
    Ingest(IngestCommand),

    /// Ask a question about your documents
    #[command(after_help = "\
EXAMPLES:
  askyourdocs ask \"What are the main conclusions?\"
  askyourdocs ask how is auth configured --mode keyword -k 3
  askyourdocs ask \"Summarize the design\" --json")]
    Ask(AskCommand),

    /// Keyword search over document chunks
    Search(SearchCommand),

    /// Find documents similar to a piece of text
    Similar(SearchCommand),

    /// Ask questions in a loop
    Interactive(InteractiveCommand),

    /// Show collection statistics and configuration
    Status,

    /// Show or change configuration
    Config {
        /// What to do
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Re-ingest previously ingested folders
    Refresh(RefreshCommand),

    /// Delete the document collection
    Reset(ConfirmArgs),
}
