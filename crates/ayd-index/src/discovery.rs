//! File discovery for ingestion.
//!
//! Walks ingestion roots for files that have a loader, skipping hidden entries,
//! build and cache directories, symlinks and oversized files.

use std::{
    ffi::OsStr,
    path::{Component, Path, PathBuf},
};

use ayd_config::FilePatterns;
use ayd_document::loader_for_path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{IndexError, store::absolute};

/// Directory names never descended into.
pub const SKIP_DIRS: &[&str] = &[
    "__pycache__",
    "node_modules",
    ".git",
    "venv",
    ".venv",
    "target",
    "dist",
    "build",
    ".tox",
    ".mypy_cache",
];

/// Returns true if `path` should be ingested.
///
/// The path is judged component by component, so pass it relative to the
/// ingestion root. Hidden components, skipped directories and extensions
/// without a loader are rejected.
pub fn should_process_file(path: &Path) -> bool {
    let excluded = path.components().any(|c| match c {
        Component::Normal(name) => is_hidden(name) || is_skipped_dir(name),
        _ => false,
    });
    !excluded && loader_for_path(path).is_some()
}

/// Finds processable files under `root`, sorted, as absolute paths.
///
/// A file root is returned on its own if processable. Symlinks are not
/// followed and files over `max_file_size` bytes are skipped.
pub fn discover_files(root: &Path, max_file_size: u64) -> Result<Vec<PathBuf>, IndexError> {
    let root = absolute(root)?;
    if !root.exists() {
        return Err(IndexError::PathNotFound(root));
    }

    if root.is_file() {
        let name = root.file_name().map(Path::new).unwrap_or(&root);
        let size = root.metadata().map_err(|e| IndexError::io(&root, e))?.len();
        if !should_process_file(name) {
            debug!(path = %root.display(), "skipping unsupported file");
            return Ok(Vec::new());
        }
        if size > max_file_size {
            warn!(path = %root.display(), size, "skipping oversized file");
            return Ok(Vec::new());
        }
        return Ok(vec![root]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_pruned(e));
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(&root) else {
            continue;
        };
        if !should_process_file(rel) {
            continue;
        }
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        if size > max_file_size {
            warn!(path = %entry.path().display(), size, "skipping oversized file");
            continue;
        }
        files.push(entry.into_path());
    }
    files.sort();
    Ok(files)
}

/// Applies include/exclude patterns to paths relative to `root`.
///
/// Paths outside `root` are matched as given.
pub fn filter_files(files: Vec<PathBuf>, root: &Path, patterns: &FilePatterns) -> Vec<PathBuf> {
    if patterns.is_empty() {
        return files;
    }
    files
        .into_iter()
        .filter(|file| {
            let rel = file.strip_prefix(root).unwrap_or(file);
            let rel = if rel.as_os_str().is_empty() {
                file.file_name().map_or(file.as_path(), Path::new)
            } else {
                rel
            };
            patterns.matches(rel)
        })
        .collect()
}

/// Directories and hidden entries the walk does not enter.
fn is_pruned(entry: &DirEntry) -> bool {
    let name = entry.file_name();
    is_hidden(name) || (entry.file_type().is_dir() && is_skipped_dir(name))
}

/// Checks if a name starts with '.'.
fn is_hidden(name: &OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

/// Checks the skip list.
fn is_skipped_dir(name: &OsStr) -> bool {
    name.to_str().is_some_and(|s| SKIP_DIRS.contains(&s))
}

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn should_process_rules() {
        assert!(should_process_file(Path::new("document.pdf")));
        assert!(should_process_file(Path::new("text.txt")));
        assert!(should_process_file(Path::new("code.py")));
        assert!(!should_process_file(Path::new("image.jpg")));
        assert!(!should_process_file(Path::new(".hidden")));
        assert!(!should_process_file(Path::new("__pycache__/file.py")));
        assert!(!should_process_file(Path::new("node_modules/lib/index.js")));
        assert!(!should_process_file(Path::new("docs/.drafts/a.md")));
        assert!(should_process_file(Path::new("./docs/a.md")));
    }

    #[test]
    fn discover_walks_and_sorts() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "b.md", "# B");
        write(root, "a.txt", "A");
        write(root, "sub/c.py", "print()");
        write(root, "image.jpg", "x");
        write(root, ".git/config.txt", "x");
        write(root, "target/out.txt", "x");
        write(root, ".notes.md", "x");

        let files = discover_files(root, u64::MAX).unwrap();
        let rel: Vec<_> = files.iter().map(|f| f.strip_prefix(root).unwrap().to_path_buf()).collect();
        assert_eq!(
            rel,
            vec![PathBuf::from("a.txt"), PathBuf::from("b.md"), PathBuf::from("sub/c.py")]
        );
        assert!(files.iter().all(|f| f.is_absolute()));
    }

    #[test]
    fn discover_skips_large_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "small.txt", "ok");
        write(temp.path(), "large.txt", &"x".repeat(100));
        let files = discover_files(temp.path(), 10).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("small.txt"));
    }

    #[test]
    fn discover_single_file() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "one.md", "# One");
        write(temp.path(), "pic.png", "x");
        assert_eq!(discover_files(&temp.path().join("one.md"), u64::MAX).unwrap().len(), 1);
        assert!(discover_files(&temp.path().join("pic.png"), u64::MAX).unwrap().is_empty());
    }

    #[test]
    fn discover_missing_root() {
        let temp = TempDir::new().unwrap();
        let err = discover_files(&temp.path().join("missing"), u64::MAX).unwrap_err();
        assert!(matches!(err, IndexError::PathNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn discover_ignores_symlinks() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        write(outside.path(), "secret.txt", "x");
        write(temp.path(), "real.txt", "x");
        symlink(outside.path(), temp.path().join("link")).unwrap();
        symlink(outside.path().join("secret.txt"), temp.path().join("alias.txt")).unwrap();
        let files = discover_files(temp.path(), u64::MAX).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn filter_include_and_exclude() {
        let files: Vec<PathBuf> = ["doc1.pdf", "doc2.txt", "temp/doc3.pdf", "code.py", "image.jpg"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let root = Path::new("");

        let include = FilePatterns::compile(&["*.pdf".into()], &[]).unwrap();
        let kept = filter_files(files.clone(), root, &include);
        assert_eq!(kept, vec![PathBuf::from("doc1.pdf"), PathBuf::from("temp/doc3.pdf")]);

        let both = FilePatterns::compile(&["*.pdf".into()], &["temp/*".into()]).unwrap();
        assert_eq!(filter_files(files.clone(), root, &both), vec![PathBuf::from("doc1.pdf")]);

        let none = FilePatterns::compile(&[], &[]).unwrap();
        assert_eq!(filter_files(files.clone(), root, &none).len(), 5);
    }

    #[test]
    fn filter_uses_root_relative_paths() {
        let root = Path::new("/docs");
        let files = vec![PathBuf::from("/docs/temp/a.pdf"), PathBuf::from("/docs/b.pdf")];
        let patterns = FilePatterns::compile(&[], &["temp/*".into()]).unwrap();
        assert_eq!(filter_files(files, root, &patterns), vec![PathBuf::from("/docs/b.pdf")]);
    }
}
