//! Ingestion pipeline.
//!
//! The [`DocumentIngestor`] runs the full flow for a set of roots:
//! 1. Discover processable files and apply include/exclude patterns
//! 2. Skip files whose content hash matches the manifest
//! 3. Load, chunk and embed changed files, replacing their stored chunks
//! 4. Drop manifest entries whose files have disappeared
//! 5. Commit once

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use ayd_config::{Config, FilePatterns};
use ayd_document::{Chunker, LoadedDocument, Metadata, load_file};
use ayd_llm::{Embedder, embed_batched};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    IndexError,
    discovery::{discover_files, filter_files, should_process_file},
    manifest::ManifestEntry,
    status::IndexStatus,
    store::{ChunkRecord, StoreWriter, VectorStoreManager, absolute, document_hash},
};

/// Per-run ingestion options.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Extra include globs. When given they replace the configured includes.
    pub include: Vec<String>,
    /// Extra exclude globs, added to the configured excludes.
    pub exclude: Vec<String>,
    /// Re-ingest files even if unchanged.
    pub force: bool,
}

/// Statistics from an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestStats {
    /// Files found after filtering.
    pub files_discovered: usize,
    /// Files loaded, chunked and stored.
    pub files_processed: usize,
    /// Files skipped because they were unchanged.
    pub files_skipped: usize,
    /// Files that failed to load or embed.
    pub files_failed: usize,
    /// Files removed because they no longer exist.
    pub files_removed: usize,
    /// Chunks written.
    pub chunks_created: usize,
    /// Failures (file path, error message).
    pub errors: Vec<(PathBuf, String)>,
    /// Wall-clock duration.
    pub elapsed: Duration,
}

impl IngestStats {
    /// Returns true if no file failed.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of files whose stored state changed.
    pub const fn total_changes(&self) -> usize {
        self.files_processed + self.files_removed
    }
}

/// Callback for reporting ingestion progress.
pub trait ProgressReporter {
    /// Called once the file list is known.
    fn on_discovered(&mut self, total: usize);

    /// Called when starting to process a file.
    fn on_file_start(&mut self, path: &Path, current: usize, total: usize);

    /// Called when a file was stored.
    fn on_file_done(&mut self, path: &Path, chunks: usize);

    /// Called when a file was unchanged.
    fn on_file_skipped(&mut self, path: &Path);

    /// Called when a file failed.
    fn on_file_error(&mut self, path: &Path, error: &str);

    /// Called when a file was removed from the collection.
    fn on_file_removed(&mut self, path: &Path);

    /// Called when the run is complete.
    fn on_complete(&mut self, stats: &IngestStats);
}

/// A no-op progress reporter.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn on_discovered(&mut self, _total: usize) {}
    fn on_file_start(&mut self, _path: &Path, _current: usize, _total: usize) {}
    fn on_file_done(&mut self, _path: &Path, _chunks: usize) {}
    fn on_file_skipped(&mut self, _path: &Path) {}
    fn on_file_error(&mut self, _path: &Path, _error: &str) {}
    fn on_file_removed(&mut self, _path: &Path) {}
    fn on_complete(&mut self, _stats: &IngestStats) {}
}

/// What happened to one file.
enum FileOutcome {
    /// Stored with this many chunks.
    Stored(usize),
    /// Unchanged since the last ingest.
    Unchanged,
}

/// Loads, chunks, embeds and stores documents.
pub struct DocumentIngestor {
    /// Target collection.
    store: VectorStoreManager,
    /// Embedding backend.
    embedder: Box<dyn Embedder>,
    /// Configured chunking.
    chunker: Chunker,
    /// Configured include globs.
    include: Vec<String>,
    /// Configured exclude globs.
    exclude: Vec<String>,
    /// Largest file accepted, in bytes.
    max_file_size: u64,
    /// Texts per embedding request.
    batch_size: usize,
}

impl DocumentIngestor {
    /// Creates an ingestor writing to `store`.
    pub fn new(config: &Config, store: VectorStoreManager, embedder: Box<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            chunker: Chunker::new(&config.chunking),
            include: config.ingestion.include_patterns.clone(),
            exclude: config.ingestion.exclude_patterns.clone(),
            max_file_size: config.ingestion.max_file_size_mb.saturating_mul(1024 * 1024),
            batch_size: config.embedding.batch_size,
        }
    }

    /// The target collection.
    pub const fn store(&self) -> &VectorStoreManager {
        &self.store
    }

    /// Compiles configured patterns merged with per-run ones.
    pub fn patterns(&self, options: &IngestOptions) -> Result<FilePatterns, IndexError> {
        let include = if options.include.is_empty() {
            &self.include
        } else {
            &options.include
        };
        let exclude: Vec<String> = self
            .exclude
            .iter()
            .chain(&options.exclude)
            .cloned()
            .collect();
        Ok(FilePatterns::compile(include, &exclude)?)
    }

    /// Loads a file and adds file-level metadata.
    ///
    /// Multiple documents from one file are joined with blank lines.
    pub fn load_document(&self, path: &Path, source_root: &Path) -> Result<LoadedDocument, IndexError> {
        let path = absolute(path)?;
        let documents = load_file(&path)?;
        let mut metadata = documents
            .first()
            .map(|d| d.metadata.clone())
            .unwrap_or_default();
        let text = documents
            .iter()
            .map(|d| d.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        let file_meta = fs::metadata(&path).map_err(|e| IndexError::io(&path, e))?;
        let modified: DateTime<Utc> = file_meta
            .modified()
            .map_or_else(|_| Utc::now(), DateTime::from);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        metadata.insert("file_path".into(), Value::from(path.to_string_lossy().into_owned()));
        metadata.insert("file_name".into(), Value::from(file_name));
        metadata.insert("document_hash".into(), Value::from(document_hash(&path)?));
        metadata.insert("file_size".into(), Value::from(file_meta.len()));
        metadata.insert(
            "modified_time".into(),
            Value::from(modified.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        metadata.insert(
            "source_root".into(),
            Value::from(source_root.to_string_lossy().into_owned()),
        );
        Ok(LoadedDocument { text, metadata })
    }

    /// Ingests every root, which may be a directory or a single file.
    pub fn ingest<R: ProgressReporter + ?Sized>(
        &mut self,
        paths: &[PathBuf],
        options: &IngestOptions,
        reporter: &mut R,
    ) -> Result<IngestStats, IndexError> {
        let mut roots = Vec::with_capacity(paths.len());
        for path in paths {
            let root = absolute(path)?;
            if !root.exists() {
                return Err(IndexError::PathNotFound(root));
            }
            roots.push(root);
        }
        self.run(&roots, options, reporter)
    }

    /// Re-ingests the roots recorded in the manifest.
    ///
    /// With `full` the collection is deleted first and every file re-embedded.
    /// Roots that no longer exist have their files removed.
    pub fn refresh<R: ProgressReporter + ?Sized>(
        &mut self,
        full: bool,
        reporter: &mut R,
    ) -> Result<IngestStats, IndexError> {
        let roots = self.store.manifest()?.source_roots();
        if full {
            self.store.reset()?;
        }
        if roots.is_empty() {
            let stats = IngestStats::default();
            reporter.on_complete(&stats);
            return Ok(stats);
        }
        let options = IngestOptions {
            force: full,
            ..IngestOptions::default()
        };
        self.run(&roots, &options, reporter)
    }

    /// Applies a batch of file-system changes seen under `roots`.
    pub fn ingest_changes<R: ProgressReporter + ?Sized>(
        &mut self,
        roots: &[PathBuf],
        changed: &[PathBuf],
        removed: &[PathBuf],
        options: &IngestOptions,
        reporter: &mut R,
    ) -> Result<IngestStats, IndexError> {
        let start = Instant::now();
        let patterns = self.patterns(options)?;
        let mut stats = IngestStats::default();
        let mut writer = self.store.open_writer()?;
        writer.set_embedding_model(&self.embedder.model_id());

        // A removed path may be a directory, so every entry under it goes too.
        let mut gone = BTreeSet::new();
        for path in removed {
            let path = absolute(path)?;
            gone.extend(writer.manifest().paths_under(&path));
            gone.insert(path);
        }
        for path in &gone {
            if !path.exists() && writer.remove_document(path) {
                info!(path = %path.display(), "removed document");
                stats.files_removed += 1;
                reporter.on_file_removed(path);
            }
        }

        // Directories moved in arrive as a single path and are expanded here.
        let mut candidates = BTreeSet::new();
        for path in changed {
            let path = absolute(path)?;
            if path.is_dir() {
                candidates.extend(discover_files(&path, self.max_file_size)?);
            } else if path.is_file() {
                candidates.insert(path);
            }
        }

        let mut work = Vec::new();
        for path in &candidates {
            let root = roots
                .iter()
                .find(|r| path.starts_with(r))
                .cloned()
                .unwrap_or_else(|| path.clone());
            let rel = path.strip_prefix(&root).unwrap_or(path);
            let rel = if rel.as_os_str().is_empty() {
                path.file_name().map_or(path.as_path(), Path::new)
            } else {
                rel
            };
            if should_process_file(rel) && patterns.matches(rel) {
                work.push((root, path.clone()));
            }
        }
        stats.files_discovered = work.len();
        reporter.on_discovered(work.len());

        let result = self.process_all(&mut writer, &work, options.force, &mut stats, reporter);
        writer.commit()?;
        result?;
        stats.elapsed = start.elapsed();
        reporter.on_complete(&stats);
        Ok(stats)
    }

    /// Discovers, filters and processes `roots`, then commits.
    fn run<R: ProgressReporter + ?Sized>(
        &mut self,
        roots: &[PathBuf],
        options: &IngestOptions,
        reporter: &mut R,
    ) -> Result<IngestStats, IndexError> {
        let start = Instant::now();
        let patterns = self.patterns(options)?;
        if self.store.index_status() == IndexStatus::ConfigChanged && !options.force {
            warn!(
                "ingestion settings changed since the last run; run 'askyourdocs refresh --full' to rebuild"
            );
        }

        let mut files: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
        for root in roots {
            if !root.exists() {
                continue;
            }
            let found = filter_files(discover_files(root, self.max_file_size)?, root, &patterns);
            for file in found {
                files.entry(file).or_insert_with(|| root.clone());
            }
        }
        let work: Vec<(PathBuf, PathBuf)> = files.into_iter().map(|(file, root)| (root, file)).collect();

        let mut stats = IngestStats {
            files_discovered: work.len(),
            ..IngestStats::default()
        };
        reporter.on_discovered(work.len());

        let mut writer = self.store.open_writer()?;
        writer.set_embedding_model(&self.embedder.model_id());

        for root in roots {
            for path in writer.manifest().paths_under(root) {
                if !path.exists() && writer.remove_document(&path) {
                    info!(path = %path.display(), "removed vanished document");
                    stats.files_removed += 1;
                    reporter.on_file_removed(&path);
                }
            }
        }

        let result = self.process_all(&mut writer, &work, options.force, &mut stats, reporter);
        writer.commit()?;
        result?;
        stats.elapsed = start.elapsed();
        info!(
            processed = stats.files_processed,
            skipped = stats.files_skipped,
            failed = stats.files_failed,
            removed = stats.files_removed,
            chunks = stats.chunks_created,
            "ingestion complete"
        );
        reporter.on_complete(&stats);
        Ok(stats)
    }

    /// Processes `(root, file)` pairs, recording failures in `stats`.
    ///
    /// Embedding provider failures abort the loop since every remaining file
    /// would fail the same way.
    fn process_all<R: ProgressReporter + ?Sized>(
        &mut self,
        writer: &mut StoreWriter,
        work: &[(PathBuf, PathBuf)],
        force: bool,
        stats: &mut IngestStats,
        reporter: &mut R,
    ) -> Result<(), IndexError> {
        let total = work.len();
        for (i, (root, file)) in work.iter().enumerate() {
            reporter.on_file_start(file, i + 1, total);
            match self.process_file(writer, root, file, force) {
                Ok(FileOutcome::Stored(chunks)) => {
                    stats.files_processed += 1;
                    stats.chunks_created += chunks;
                    reporter.on_file_done(file, chunks);
                }
                Ok(FileOutcome::Unchanged) => {
                    stats.files_skipped += 1;
                    reporter.on_file_skipped(file);
                }
                Err(IndexError::Embedding(e)) => {
                    stats.files_failed += 1;
                    stats.errors.push((file.clone(), e.to_string()));
                    reporter.on_file_error(file, &e.to_string());
                    return Err(IndexError::Embedding(e));
                }
                Err(e) => {
                    warn!(path = %file.display(), error = %e, "failed to ingest file");
                    stats.files_failed += 1;
                    stats.errors.push((file.clone(), e.to_string()));
                    reporter.on_file_error(file, &e.to_string());
                }
            }
        }
        Ok(())
    }

    /// Ingests one file unless it is unchanged and `force` is off.
    fn process_file(
        &mut self,
        writer: &mut StoreWriter,
        root: &Path,
        file: &Path,
        force: bool,
    ) -> Result<FileOutcome, IndexError> {
        let hash = document_hash(file)?;
        if !force
            && writer
                .manifest()
                .get(file)
                .is_some_and(|e| e.document_hash == hash)
        {
            debug!(path = %file.display(), "unchanged");
            return Ok(FileOutcome::Unchanged);
        }

        let document = self.load_document(file, root)?;
        let chunks = self.chunker.chunk(&document.text);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embed_batched(self.embedder.as_mut(), &texts, self.batch_size, |done, total| {
            debug!(path = %file.display(), done, total, "embedded batch");
        })?;

        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                let mut metadata: Metadata = document.metadata.clone();
                metadata.insert("chunk_index".into(), Value::from(chunk.index));
                metadata.insert("chunk_start".into(), Value::from(chunk.start));
                metadata.insert("chunk_end".into(), Value::from(chunk.end));
                if let Some(section) = chunk.section {
                    metadata.insert("section".into(), Value::from(section));
                }
                ChunkRecord {
                    text: chunk.text,
                    metadata,
                    embedding,
                }
            })
            .collect();
        let chunk_count = records.len();

        let file_meta = fs::metadata(file).map_err(|e| IndexError::io(file, e))?;
        let entry = ManifestEntry {
            document_hash: hash,
            mtime: file_meta.modified().map_or_else(|_| Utc::now(), DateTime::from),
            size: file_meta.len(),
            chunk_count,
            ingested_at: Utc::now(),
            source_root: root.to_path_buf(),
        };
        writer.add_document(file, records, entry)?;
        info!(path = %file.display(), chunks = chunk_count, "ingested");
        Ok(FileOutcome::Stored(chunk_count))
    }
}
