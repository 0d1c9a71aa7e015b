//! Error types for AskYourDocs configuration.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::validate::ValidationIssue;

/// Errors that can occur when loading, editing, or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write a configuration file.
    #[error("failed to write config file {path}: {source}")]
    WriteFile {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// The merged configuration has values of the wrong shape or type.
    #[error("invalid configuration: {source}")]
    Deserialize {
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// The configuration parsed but failed validation.
    #[error("invalid configuration: {}", join_issues(.issues))]
    Invalid {
        /// Every problem found.
        issues: Vec<ValidationIssue>,
    },

    /// A dotted key does not name a configuration value.
    #[error("unknown configuration key: {key}")]
    UnknownKey {
        /// The key that was looked up.
        key: String,
    },

    /// A value given on the command line could not be parsed.
    #[error("invalid value '{value}' for {key}: {message}")]
    InvalidValue {
        /// The key being set.
        key: String,
        /// The raw value.
        value: String,
        /// What was wrong with it.
        message: String,
    },

    /// Failed to compile a glob pattern.
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The invalid pattern.
        pattern: String,
        /// Underlying glob error.
        source: globset::Error,
    },

    /// Failed to determine home or project directories.
    #[error("could not determine home directory")]
    NoHomeDirectory,
}

/// Renders validation issues as a single `; `-separated line.
fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
