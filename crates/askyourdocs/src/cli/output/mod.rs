//! Rendering and JSON serialization for CLI output.

mod progress;

use std::{fmt::Display, process::ExitCode, time::Duration};

use ayd_highlight::Palette;
use ayd_index::{IngestStats, StorageStats};
use ayd_query::{Answer, KeywordHit, SimilarDocument};
use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
pub use progress::IngestProgress;
use serde::Serialize;

/// Prints `error: <message>` and an optional hint to stderr.
pub fn print_error(message: &dyn Display, hint: Option<String>) -> ExitCode {
    eprintln!("error: {message}");
    if let Some(hint) = hint {
        eprintln!("hint: {hint}");
    }
    ExitCode::FAILURE
}

/// Prints `value` as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => print_error(&format!("failed to serialize JSON: {e}"), None),
    }
}

/// Formats a duration as seconds with one decimal.
pub fn format_duration(elapsed: Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}

/// A two-column table.
fn key_value_table(rows: &[(&str, String)]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    table
}

/// Renders the summary of an ingestion run.
pub fn ingest_summary(stats: &IngestStats) -> Table {
    key_value_table(&[
        ("Files discovered", stats.files_discovered.to_string()),
        ("Processed", stats.files_processed.to_string()),
        ("Unchanged", stats.files_skipped.to_string()),
        ("Removed", stats.files_removed.to_string()),
        ("Failed", stats.files_failed.to_string()),
        ("Chunks created", stats.chunks_created.to_string()),
        ("Time", format_duration(stats.elapsed)),
    ])
}

/// Renders storage statistics.
pub fn storage_table(stats: &StorageStats) -> Table {
    key_value_table(&[
        ("Documents", stats.document_count.to_string()),
        ("Chunks", stats.chunk_count.to_string()),
        ("Collection", stats.collection_name.clone()),
        ("Storage size", stats.storage_size.clone()),
        ("Storage path", stats.storage_path.display().to_string()),
        ("Embedding model", non_empty(&stats.embedding_model)),
        ("Dimension", stats.dimension.to_string()),
    ])
}

/// Returns `value`, or "-" when it is empty.
fn non_empty(value: &str) -> String {
    if value.is_empty() {
        "-".into()
    } else {
        value.to_string()
    }
}

/// Prints the failures of an ingestion run.
pub fn print_ingest_errors(stats: &IngestStats, palette: Palette) {
    if stats.errors.is_empty() {
        return;
    }
    eprintln!("{}", palette.warning(&format!("{} file(s) failed:", stats.errors.len())));
    for (path, message) in &stats.errors {
        eprintln!("  {}: {message}", path.display());
    }
}

/// Prints the sources list of an answer.
pub fn print_sources(answer: &Answer, palette: Palette) {
    if answer.sources.is_empty() {
        return;
    }
    println!();
    println!("{}", palette.subheader("Sources:"));
    for (i, source) in answer.sources.iter().enumerate() {
        println!(
            "  [{}] {} {}",
            i + 1,
            source.file_name,
            palette.dim(&format!("({:.2}) {}", source.score, source.file_path))
        );
    }
}

/// Prints the footer line with mode and timing.
pub fn print_answer_footer(answer: &Answer, palette: Palette) {
    println!(
        "{}",
        palette.dim(&format!("{} retrieval, {}", answer.mode, format_duration(answer.elapsed)))
    );
}

/// Renders keyword search hits.
pub fn keyword_table(hits: &[KeywordHit]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["#", "File", "Score", "Preview"]);
    for (i, hit) in hits.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&hit.file),
            Cell::new(format!("{:.2}", hit.score)),
            Cell::new(&hit.preview),
        ]);
    }
    table
}

/// Renders similar documents.
pub fn similar_table(docs: &[SimilarDocument]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["#", "File", "Similarity", "Preview"]);
    for (i, doc) in docs.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&doc.file_path),
            Cell::new(format!("{:.3}", doc.similarity_score)),
            Cell::new(&doc.content_preview),
        ]);
    }
    table
}
