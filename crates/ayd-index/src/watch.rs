//! Re-ingestion on file-system changes.

use std::{
    collections::BTreeSet,
    mem,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError},
    },
    time::Duration,
};

use ayd_config::IngestionConfig;
use ayd_document::loader_for_path;
use notify_debouncer_full::{
    DebounceEventResult, DebouncedEvent, new_debouncer,
    notify::{EventKind, RecursiveMode, event::ModifyKind},
};
use tracing::{debug, info, warn};

use crate::{
    IndexError,
    ingest::{DocumentIngestor, IngestOptions, ProgressReporter},
    store::absolute,
};

/// How often the stop flag is checked while waiting for events.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Kind of change seen for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The file was created.
    Created,
    /// The file contents changed.
    Modified,
    /// The file was deleted or moved away.
    Removed,
}

/// Changes drained from a [`DocumentChangeHandler`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    /// Files to (re-)ingest.
    pub changed: Vec<PathBuf>,
    /// Files to remove from the collection.
    pub removed: Vec<PathBuf>,
}

impl ChangeBatch {
    /// Returns true if there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Accumulates debounced changes between ingestion passes.
#[derive(Debug, Clone)]
pub struct DocumentChangeHandler {
    /// Quiet period before a change is acted on.
    pub debounce_time: Duration,
    /// Files created or modified since the last batch.
    pending_files: BTreeSet<PathBuf>,
    /// Files removed since the last batch.
    removed: BTreeSet<PathBuf>,
}

impl DocumentChangeHandler {
    /// Creates a handler with the given debounce time.
    pub const fn new(debounce_time: Duration) -> Self {
        Self {
            debounce_time,
            pending_files: BTreeSet::new(),
            removed: BTreeSet::new(),
        }
    }

    /// Creates a handler using `ingestion.watch_debounce`.
    pub const fn from_config(config: &IngestionConfig) -> Self {
        Self::new(config.watch_debounce)
    }

    /// Queues a change.
    ///
    /// Changes are kept for loadable files. Directories are also kept when
    /// created or removed, so moves of whole trees are seen. Returns true if the path was queued. A later change to the
    /// same path overrides an earlier one.
    pub fn record(&mut self, path: &Path, kind: ChangeKind) -> bool {
        let keep = match kind {
            ChangeKind::Removed => true,
            ChangeKind::Created => loader_for_path(path).is_some() || path.is_dir(),
            ChangeKind::Modified => loader_for_path(path).is_some(),
        };
        if !keep {
            return false;
        }
        match kind {
            ChangeKind::Created | ChangeKind::Modified => {
                self.removed.remove(path);
                self.pending_files.insert(path.to_path_buf());
            }
            ChangeKind::Removed => {
                self.pending_files.remove(path);
                self.removed.insert(path.to_path_buf());
            }
        }
        true
    }

    /// Queues the paths of a debounced event.
    ///
    /// Renames and ambiguous events are classified by whether the path still exists.
    pub fn record_event(&mut self, event: &DebouncedEvent) {
        let kind = match event.kind {
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Created,
            EventKind::Modify(_) | EventKind::Any | EventKind::Other => ChangeKind::Modified,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Access(_) => return,
        };
        for path in &event.paths {
            let kind = if kind != ChangeKind::Removed && !path.exists() {
                ChangeKind::Removed
            } else if kind == ChangeKind::Removed && path.is_file() {
                ChangeKind::Modified
            } else {
                kind
            };
            if self.record(path, kind) {
                debug!(path = %path.display(), ?kind, "queued change");
            }
        }
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending_files.is_empty() && self.removed.is_empty()
    }

    /// Drains every queued change.
    pub fn take_batch(&mut self) -> ChangeBatch {
        ChangeBatch {
            changed: mem::take(&mut self.pending_files).into_iter().collect(),
            removed: mem::take(&mut self.removed).into_iter().collect(),
        }
    }
}

/// Watches `roots` and re-ingests changed files until `stop` is set.
///
/// Each debounced batch is applied with [`DocumentIngestor::ingest_changes`].
/// A failing batch is logged and watching continues.
pub fn watch<R: ProgressReporter + ?Sized>(
    ingestor: &mut DocumentIngestor,
    roots: &[PathBuf],
    options: &IngestOptions,
    handler: &mut DocumentChangeHandler,
    reporter: &mut R,
    stop: &AtomicBool,
) -> Result<(), IndexError> {
    let mut watch_roots = Vec::with_capacity(roots.len());
    for root in roots {
        let root = absolute(root)?;
        if !root.exists() {
            return Err(IndexError::PathNotFound(root));
        }
        watch_roots.push(root);
    }

    let (tx, rx) = mpsc::channel::<DebounceEventResult>();
    let mut debouncer = new_debouncer(handler.debounce_time, None, tx)?;
    for root in &watch_roots {
        debouncer.watch(root, RecursiveMode::Recursive)?;
        info!(path = %root.display(), "watching for changes");
    }

    while !stop.load(Ordering::SeqCst) {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(events)) => {
                for event in &events {
                    handler.record_event(event);
                }
            }
            Ok(Err(errors)) => {
                for error in errors {
                    warn!(%error, "file watcher error");
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if handler.is_empty() {
            continue;
        }
        let batch = handler.take_batch();
        info!(changed = batch.changed.len(), removed = batch.removed.len(), "applying changes");
        if let Err(e) =
            ingestor.ingest_changes(&watch_roots, &batch.changed, &batch.removed, options, reporter)
        {
            warn!(error = %e, "failed to apply changes");
        }
    }
    debug!("watch stopped");
    Ok(())
}
