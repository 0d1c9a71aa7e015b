//! Progress bar for ingestion.

use std::path::Path;

use ayd_highlight::Palette;
use ayd_index::{IngestStats, ProgressReporter};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Bar layout.
const TEMPLATE: &str = "{spinner} [{bar:30}] {pos}/{len} {wide_msg}";

/// Reports ingestion progress on stderr.
///
/// The bar is hidden when stderr is not a terminal. Per-file events are also
/// printed as lines in watch mode, where runs are small and frequent.
pub struct IngestProgress {
    /// The bar, created once the file count is known.
    bar: Option<ProgressBar>,
    /// Whether to draw at all.
    visible: bool,
    /// Print one line per changed file.
    log_files: bool,
    /// Output styles.
    palette: Palette,
}

impl IngestProgress {
    /// Creates a reporter.
    pub const fn new(visible: bool, palette: Palette) -> Self {
        Self {
            bar: None,
            visible,
            log_files: false,
            palette,
        }
    }

    /// Creates a reporter that prints a line per file instead of a bar.
    pub const fn for_watch(palette: Palette) -> Self {
        Self {
            bar: None,
            visible: false,
            log_files: true,
            palette,
        }
    }

    /// Prints a line above the bar, or directly when there is none.
    fn line(&self, text: &str) {
        match &self.bar {
            Some(bar) => bar.println(text),
            None => eprintln!("{text}"),
        }
    }
}

impl ProgressReporter for IngestProgress {
    fn on_discovered(&mut self, total: usize) {
        if !self.visible || total == 0 {
            return;
        }
        let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        self.bar = Some(bar);
    }

    fn on_file_start(&mut self, path: &Path, current: usize, _total: usize) {
        if let Some(bar) = &self.bar {
            bar.set_position(current.saturating_sub(1) as u64);
            let name = path.file_name().map_or_else(
                || path.display().to_string(),
                |n| n.to_string_lossy().into_owned(),
            );
            bar.set_message(name);
        }
    }

    fn on_file_done(&mut self, path: &Path, chunks: usize) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
        if self.log_files {
            let ingested = self.palette.success("ingested");
            self.line(&format!("{ingested} {} ({chunks} chunks)", path.display()));
        }
    }

    fn on_file_skipped(&mut self, _path: &Path) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn on_file_error(&mut self, path: &Path, error: &str) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
        if self.log_files {
            self.line(&format!("{} {}: {error}", self.palette.warning("failed"), path.display()));
        }
    }

    fn on_file_removed(&mut self, path: &Path) {
        if self.log_files {
            self.line(&format!("{} {}", self.palette.dim("removed"), path.display()));
        }
    }

    fn on_complete(&mut self, _stats: &IngestStats) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
