//! Collection status relative to the current configuration.

use std::{fs, path::Path};

use crate::IndexError;

/// Status of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// Data exists and was built with the current settings.
    Current,
    /// Data exists but ingestion settings changed since (needs a full rebuild).
    ConfigChanged,
    /// Nothing has been ingested.
    Missing,
}

impl IndexStatus {
    /// Returns a human-readable description for display.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::ConfigChanged => "stale (config changed)",
            Self::Missing => "missing",
        }
    }

    /// Returns true if the collection should be rebuilt from scratch.
    pub const fn needs_rebuild(self) -> bool {
        matches!(self, Self::ConfigChanged)
    }

    /// Compares a stored hash with the current one.
    pub fn from_hashes(stored: Option<&str>, current: &str) -> Self {
        match stored {
            None => Self::Missing,
            Some(stored) if stored == current => Self::Current,
            Some(_) => Self::ConfigChanged,
        }
    }
}

/// Reads the stored config hash, or `None` if it was never written.
pub fn read_stored_hash(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Writes the config hash.
pub fn write_config_hash(path: &Path, hash: &str) -> Result<(), IndexError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| IndexError::io(parent, e))?;
    }
    fs::write(path, hash).map_err(|e| IndexError::io(path, e))
}

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn status_from_hashes() {
        assert_eq!(IndexStatus::from_hashes(None, "abc"), IndexStatus::Missing);
        assert_eq!(IndexStatus::from_hashes(Some("abc"), "abc"), IndexStatus::Current);
        assert_eq!(IndexStatus::from_hashes(Some("old"), "abc"), IndexStatus::ConfigChanged);
        assert!(IndexStatus::ConfigChanged.needs_rebuild());
        assert!(!IndexStatus::Missing.needs_rebuild());
    }

    #[test]
    fn hash_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("collection").join("config_hash");
        assert!(read_stored_hash(&path).is_none());
        write_config_hash(&path, "0123456789abcdef").unwrap();
        assert_eq!(read_stored_hash(&path).as_deref(), Some("0123456789abcdef"));
    }
}
