//! JSON persistence with atomic replacement.

use std::{fs, path::Path};

use serde::{Serialize, de::DeserializeOwned};

use crate::IndexError;

/// Reads a JSON file, returning `None` when it does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, IndexError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read(path).map_err(|e| IndexError::io(path, e))?;
    serde_json::from_slice(&contents)
        .map(Some)
        .map_err(|e| IndexError::Serde {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Writes `value` as JSON to a sibling temp file, then renames it over `path`.
///
/// Readers see either the previous file or the new one, never a partial write.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<(), IndexError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| IndexError::io(parent, e))?;
    }
    let contents = if pretty {
        serde_json::to_vec_pretty(value)
    } else {
        serde_json::to_vec(value)
    }
    .map_err(|e| IndexError::Serde {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);
    fs::write(tmp, contents).map_err(|e| IndexError::io(tmp, e))?;
    fs::rename(tmp, path).map_err(|e| IndexError::io(path, e))
}
