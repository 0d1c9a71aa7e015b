//! Implementation of `askyourdocs refresh`.

use std::{
    io::{self, IsTerminal},
    process::ExitCode,
};

use crate::cli::{
    args::RefreshCommand,
    context::CommandContext,
    output::{IngestProgress, ingest_summary, print_error, print_ingest_errors},
};

/// Re-ingests every previously ingested source root.
///
/// A collection built with different ingestion settings is always rebuilt
/// from scratch.
pub fn run(ctx: &CommandContext, cmd: RefreshCommand) -> ExitCode {
    let palette = ctx.palette;
    let mut ingestor = match ctx.ingestor() {
        Ok(ingestor) => ingestor,
        Err(code) => return code,
    };

    let stale = ingestor.store().index_status().needs_rebuild();
    let full = cmd.full || stale;
    if stale && !cmd.full {
        println!(
            "{}",
            palette.warning("Ingestion settings changed since the last run; rebuilding everything.")
        );
    }

    let title = if full { "Rebuilding collection" } else { "Refreshing collection" };
    println!("{}", palette.header(title));
    println!();

    let mut progress = IngestProgress::new(io::stderr().is_terminal(), palette);
    let stats = match ingestor.refresh(full, &mut progress) {
        Ok(stats) => stats,
        Err(e) => return print_error(&e, e.hint()),
    };

    if stats.files_discovered == 0 && stats.files_removed == 0 {
        println!(
            "{}",
            palette.dim("Nothing to refresh. Run 'askyourdocs ingest <path>' first.")
        );
        return ExitCode::SUCCESS;
    }

    println!("{}", ingest_summary(&stats));
    print_ingest_errors(&stats, palette);
    if stats.total_changes() == 0 {
        println!("{}", palette.dim("Collection is up to date."));
    } else {
        println!("{}", palette.success("Refresh complete."));
    }

    if stats.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
