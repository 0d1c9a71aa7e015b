//! Project configuration discovery.
//!
//! Discovers `.askyourdocs.yaml` files by walking up the directory tree from a
//! starting point. The global `config.yaml` is owned by [`crate::ConfigManager`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_yaml::Value;

/// The project configuration filename.
pub const CONFIG_FILENAME: &str = ".askyourdocs.yaml";

/// Discovers all project configuration files relevant to the given directory.
///
/// Returns paths in precedence order: closest to `cwd` first. The walk stops at
/// the first file that sets `root: true`.
pub fn discover_config_files(cwd: &Path) -> Vec<PathBuf> {
    let mut configs = Vec::new();

    let mut current = Some(cwd);
    while let Some(dir) = current {
        let config_path = dir.join(CONFIG_FILENAME);
        if config_path.is_file() {
            let is_root = is_root_config(&config_path);
            configs.push(config_path);
            if is_root {
                break;
            }
        }
        current = dir.parent();
    }

    configs
}

/// Returns true if the file at `path` parses and sets `root: true`.
///
/// Unreadable or malformed files are not root configs; the error surfaces later
/// when the file is actually loaded.
pub fn is_root_config(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(value) = serde_yaml::from_str::<Value>(&contents) else {
        return false;
    };
    value.get("root").and_then(Value::as_bool) == Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestDir;

    #[test]
    fn test_discover_no_configs() {
        let test_dir = TestDir::new();
        let subdir = test_dir.create_dir("a/b/c");
        let configs = discover_config_files(&subdir);
        assert!(configs.iter().all(|c| !c.starts_with(test_dir.path())));
    }

    #[test]
    fn test_discover_single_config() {
        let test_dir = TestDir::new();
        let config = test_dir.create_config("project");
        let subdir = test_dir.create_dir("project/src/deep");

        let configs = discover_config_files(&subdir);
        assert_eq!(configs.first(), Some(&config));
    }

    #[test]
    fn test_discover_closest_first() {
        let test_dir = TestDir::new();
        let outer = test_dir.create_config("a");
        let inner = test_dir.create_config("a/b");
        let subdir = test_dir.create_dir("a/b/c");

        let configs = discover_config_files(&subdir);
        let ours: Vec<_> = configs
            .iter()
            .filter(|c| c.starts_with(test_dir.path()))
            .collect();
        assert_eq!(ours, vec![&inner, &outer]);
    }

    #[test]
    fn test_root_config_stops_walk() {
        let test_dir = TestDir::new();
        test_dir.create_config("a");
        let root = test_dir.create_root_config("a/b");
        let subdir = test_dir.create_dir("a/b/c");

        let configs = discover_config_files(&subdir);
        assert_eq!(configs, vec![root]);
    }

    #[test]
    fn test_is_root_config() {
        let test_dir = TestDir::new();
        let root = test_dir.create_root_config("r");
        let plain = test_dir.create_config_with_content("p", "root: false\n");
        let broken = test_dir.create_config_with_content("b", "root: [unclosed\n");
        assert!(is_root_config(&root));
        assert!(!is_root_config(&plain));
        assert!(!is_root_config(&broken));
    }
}
