//! Include/exclude pattern compilation and matching.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::ConfigError;

/// Compiled include and exclude globs for ingestion.
#[derive(Debug, Clone)]
pub struct FilePatterns {
    /// Compiled include patterns, `None` when every file is included.
    include: Option<GlobSet>,
    /// Compiled exclude patterns.
    exclude: GlobSet,
}

impl FilePatterns {
    /// Compiles include/exclude patterns into matchers.
    ///
    /// An empty include list includes everything.
    pub fn compile(include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        let include = if include.is_empty() {
            None
        } else {
            Some(build_set(include)?)
        };
        Ok(Self {
            include,
            exclude: build_set(exclude)?,
        })
    }

    /// Checks whether a path passes the patterns.
    ///
    /// The path should be relative to the ingestion root. Patterns are tested
    /// against the whole relative path and against the bare file name, so `*.pdf`
    /// and `temp/*` both behave as expected. `*` crosses directory separators.
    pub fn matches(&self, path: &Path) -> bool {
        let file_name = path.file_name().map(Path::new);
        let hit = |set: &GlobSet| set.is_match(path) || file_name.is_some_and(|n| set.is_match(n));

        let included = self.include.as_ref().is_none_or(hit);
        included && !hit(&self.exclude)
    }

    /// Returns true if neither include nor exclude patterns were given.
    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_empty()
    }
}

/// Builds a glob set from patterns.
fn build_set(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile_glob(pattern)?);
    }
    builder.build().map_err(|e| ConfigError::InvalidPattern {
        pattern: patterns.join(", "),
        source: e,
    })
}

/// Compiles a single glob pattern.
fn compile_glob(pattern: &str) -> Result<Glob, ConfigError> {
    Glob::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source: e,
    })
}
