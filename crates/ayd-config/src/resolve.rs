//! Path resolution for configured locations.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::ConfigError;

/// Name of the storage directory created under the data directory.
const DEFAULT_STORAGE_DIR: &str = "storage";

/// Resolves the configured storage path to an absolute path.
///
/// - unset: `storage` under `data_dir`
/// - tilde paths (`~/ayd`): expanded to the home directory
/// - relative paths: joined onto `cwd`
/// - absolute paths: returned unchanged
///
/// The directory does not have to exist.
pub fn resolve_storage_path(
    path: Option<&str>,
    cwd: &Path,
    data_dir: &Path,
) -> Result<PathBuf, ConfigError> {
    let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(data_dir.join(DEFAULT_STORAGE_DIR));
    };
    let expanded = expand_tilde(path)?;
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(cwd.join(expanded))
    }
}

/// Expands a tilde prefix to the home directory.
///
/// - `~` alone becomes the home directory
/// - `~/foo` becomes home directory joined with `foo`
/// - Paths not starting with `~` are returned unchanged
pub fn expand_tilde(path: &str) -> Result<PathBuf, ConfigError> {
    if path == "~" {
        return home_dir();
    }

    if let Some(rest) = path.strip_prefix("~/") {
        let home = home_dir()?;
        return Ok(home.join(rest));
    }

    Ok(PathBuf::from(path))
}

/// Returns the home directory.
fn home_dir() -> Result<PathBuf, ConfigError> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDirectory)
}
