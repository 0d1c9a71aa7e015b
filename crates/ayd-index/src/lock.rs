//! Single-writer lock for a collection.

use std::{
    fs::{self, OpenOptions},
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
    process,
    time::{Duration, SystemTime},
};

use tracing::warn;

use crate::IndexError;

/// Locks older than this are assumed abandoned and replaced, as are locks
/// whose writer process is gone.
pub const STALE_LOCK_AGE: Duration = Duration::from_secs(10 * 60);

/// Holds the collection lock file until dropped.
#[derive(Debug)]
pub struct WriterLock {
    /// Lock file path.
    path: PathBuf,
}

impl WriterLock {
    /// Creates the lock file, failing with [`IndexError::Locked`] if another
    /// writer holds a fresh one.
    pub fn acquire(path: &Path) -> Result<Self, IndexError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| IndexError::io(parent, e))?;
        }
        match create_lock_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if !is_stale(path) {
                    return Err(IndexError::Locked {
                        path: path.to_path_buf(),
                    });
                }
                warn!(path = %path.display(), "replacing stale collection lock");
                fs::remove_file(path).map_err(|e| IndexError::io(path, e))?;
                create_lock_file(path).map_err(|e| match e.kind() {
                    ErrorKind::AlreadyExists => IndexError::Locked {
                        path: path.to_path_buf(),
                    },
                    _ => IndexError::io(path, e),
                })?;
            }
            Err(e) => return Err(IndexError::io(path, e)),
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Lock file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WriterLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path)
            && e.kind() != ErrorKind::NotFound
        {
            warn!(path = %self.path.display(), error = %e, "failed to release collection lock");
        }
    }
}

/// Creates the lock file exclusively and records our pid in it.
fn create_lock_file(path: &Path) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    writeln!(file, "{}", process::id())
}

/// Returns true if the lock file is older than [`STALE_LOCK_AGE`] or its
/// writer has exited.
fn is_stale(path: &Path) -> bool {
    let expired = fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > STALE_LOCK_AGE);
    expired || holder_has_exited(path)
}

/// True when the recorded pid names no running process.
///
/// Only answerable where `/proc` is mounted. Elsewhere, or when the pid cannot
/// be read, the holder is assumed alive.
fn holder_has_exited(path: &Path) -> bool {
    let Some(pid) = fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
    else {
        return false;
    };
    let proc = Path::new("/proc");
    proc.join("self").exists() && !proc.join(pid.to_string()).exists()
}

#[cfg(test)]
mod test {
    use std::fs::File;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn second_writer_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".lock");
        let lock = WriterLock::acquire(&path).unwrap();
        assert!(path.exists());

        let err = WriterLock::acquire(&path).unwrap_err();
        assert!(matches!(err, IndexError::Locked { .. }));

        drop(lock);
        assert!(!path.exists());
        WriterLock::acquire(&path).unwrap();
    }

    #[test]
    fn stale_lock_is_replaced() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".lock");
        let file = File::create(&path).unwrap();
        let old = SystemTime::now() - STALE_LOCK_AGE - Duration::from_secs(60);
        file.set_modified(old).unwrap();
        drop(file);

        let lock = WriterLock::acquire(&path).unwrap();
        assert_eq!(lock.path(), path);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn lock_of_exited_writer_is_replaced() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".lock");
        fs::write(&path, "999999999\n").unwrap();
        assert!(is_stale(&path));
        WriterLock::acquire(&path).unwrap();

        let unreadable = temp.path().join("other.lock");
        fs::write(&unreadable, "").unwrap();
        assert!(!is_stale(&unreadable));
    }
}
