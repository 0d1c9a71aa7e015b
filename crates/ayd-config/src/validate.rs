//! Configuration validation.
//!
//! Range checks shared by config loading and command-line overrides. Each
//! `validate_*` helper returns the human-readable reason on failure so that
//! the CLI can print it next to the flag that was wrong.

use std::fmt;

use crate::Config;

/// Smallest accepted chunk size in characters.
pub const MIN_CHUNK_SIZE: usize = 100;

/// Largest accepted chunk size in characters.
pub const MAX_CHUNK_SIZE: usize = 8000;

/// Largest accepted number of retrieved chunks.
pub const MAX_TOP_K: i64 = 50;

/// A single problem found while validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted key of the offending value, e.g. `chunking.chunk_overlap`.
    pub key: String,
    /// Why the value was rejected.
    pub message: String,
}

impl ValidationIssue {
    /// Creates a new issue for `key`.
    fn new(key: &str, message: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

/// Checks that a chunk size is usable.
pub fn validate_chunk_size(size: usize) -> Result<(), String> {
    if size == 0 {
        return Err("chunk size must be positive".into());
    }
    if size < MIN_CHUNK_SIZE {
        return Err(format!(
            "chunk size {size} is too small (minimum {MIN_CHUNK_SIZE})"
        ));
    }
    if size > MAX_CHUNK_SIZE {
        return Err(format!(
            "chunk size {size} is too large (maximum {MAX_CHUNK_SIZE})"
        ));
    }
    Ok(())
}

/// Checks that a result count is usable.
///
/// Takes a signed value so that negative command-line input gets a proper
/// message instead of a parse error.
pub fn validate_top_k(top_k: i64) -> Result<(), String> {
    if top_k <= 0 {
        return Err("top_k must be positive".into());
    }
    if top_k > MAX_TOP_K {
        return Err(format!("top_k {top_k} is too large (maximum {MAX_TOP_K})"));
    }
    Ok(())
}

/// Checks that a cosine similarity threshold lies in the unit interval.
pub fn validate_similarity_threshold(threshold: f32) -> Result<(), String> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(format!(
            "similarity threshold {threshold} must be between 0.0 and 1.0"
        ));
    }
    Ok(())
}

/// Validates every section and returns all problems found.
pub fn validate_config(config: &Config) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let model = &config.model;
    if model.name.trim().is_empty() {
        issues.push(ValidationIssue::new("model.name", "must not be empty"));
    }
    if !(0.0..=2.0).contains(&model.temperature) {
        issues.push(ValidationIssue::new(
            "model.temperature",
            format!("{} must be between 0.0 and 2.0", model.temperature),
        ));
    }
    if model.max_tokens == 0 {
        issues.push(ValidationIssue::new("model.max_tokens", "must be at least 1"));
    }
    if model.timeout.is_zero() {
        issues.push(ValidationIssue::new("model.timeout", "must be at least 1 second"));
    }

    let embedding = &config.embedding;
    if embedding.model.trim().is_empty() {
        issues.push(ValidationIssue::new("embedding.model", "must not be empty"));
    }
    if !(1..=1024).contains(&embedding.batch_size) {
        issues.push(ValidationIssue::new(
            "embedding.batch_size",
            format!("{} must be between 1 and 1024", embedding.batch_size),
        ));
    }
    if embedding.max_length == 0 {
        issues.push(ValidationIssue::new("embedding.max_length", "must be at least 1"));
    }

    let chunking = &config.chunking;
    if let Err(message) = validate_chunk_size(chunking.chunk_size) {
        issues.push(ValidationIssue::new("chunking.chunk_size", message));
    }
    if chunking.chunk_overlap >= chunking.chunk_size {
        issues.push(ValidationIssue::new(
            "chunking.chunk_overlap",
            format!(
                "{} must be smaller than chunk_size ({})",
                chunking.chunk_overlap, chunking.chunk_size
            ),
        ));
    }
    if chunking.min_chunk_size > chunking.chunk_size {
        issues.push(ValidationIssue::new(
            "chunking.min_chunk_size",
            "must not exceed chunk_size",
        ));
    }

    let retrieval = &config.retrieval;
    if let Err(message) = validate_top_k(i64::try_from(retrieval.top_k).unwrap_or(i64::MAX)) {
        issues.push(ValidationIssue::new("retrieval.top_k", message));
    }
    if let Err(message) = validate_similarity_threshold(retrieval.similarity_threshold) {
        issues.push(ValidationIssue::new("retrieval.similarity_threshold", message));
    }
    if retrieval.max_context_length == 0 {
        issues.push(ValidationIssue::new(
            "retrieval.max_context_length",
            "must be at least 1",
        ));
    }

    if config.storage.collection_name.trim().is_empty() {
        issues.push(ValidationIssue::new(
            "storage.collection_name",
            "must not be empty",
        ));
    }
    if config.ingestion.max_file_size_mb == 0 {
        issues.push(ValidationIssue::new(
            "ingestion.max_file_size_mb",
            "must be at least 1",
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_size_bounds() {
        assert!(validate_chunk_size(0).unwrap_err().contains("positive"));
        assert!(validate_chunk_size(50).unwrap_err().contains("too small"));
        assert!(validate_chunk_size(10_000).unwrap_err().contains("too large"));
        assert!(validate_chunk_size(1000).is_ok());
        assert!(validate_chunk_size(500).is_ok());
    }

    #[test]
    fn top_k_bounds() {
        assert!(validate_top_k(0).unwrap_err().contains("positive"));
        assert!(validate_top_k(-5).unwrap_err().contains("positive"));
        assert!(validate_top_k(100).unwrap_err().contains("too large"));
        assert!(validate_top_k(5).is_ok());
        assert!(validate_top_k(10).is_ok());
    }

    #[test]
    fn similarity_threshold_bounds() {
        for ok in [0.0, 0.5, 0.7, 1.0] {
            assert!(validate_similarity_threshold(ok).is_ok(), "{ok}");
        }
        for bad in [-0.1, 1.5] {
            let err = validate_similarity_threshold(bad).unwrap_err();
            assert!(err.contains("between 0.0 and 1.0"), "{err}");
        }
    }

    #[test]
    fn default_config_has_no_issues() {
        assert!(validate_config(&Config::default()).is_empty());
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let mut config = Config::default();
        config.chunking.chunk_size = 1000;
        config.chunking.chunk_overlap = 1000;
        let issues = validate_config(&config);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key, "chunking.chunk_overlap");
    }

    #[test]
    fn threshold_out_of_range_is_reported() {
        let mut config = Config::default();
        config.retrieval.similarity_threshold = 1.5;
        let issues = validate_config(&config);
        assert_eq!(issues[0].key, "retrieval.similarity_threshold");
    }

    #[test]
    fn multiple_issues_are_collected() {
        let mut config = Config::default();
        config.model.max_tokens = 0;
        config.model.temperature = 3.0;
        config.retrieval.top_k = 0;
        assert_eq!(validate_config(&config).len(), 3);
    }

    #[test]
    fn issue_display_includes_key() {
        let issue = ValidationIssue::new("model.max_tokens", "must be at least 1");
        assert_eq!(issue.to_string(), "model.max_tokens: must be at least 1");
    }
}
