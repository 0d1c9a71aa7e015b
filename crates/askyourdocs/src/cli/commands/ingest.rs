//! Implementation of `askyourdocs ingest`.

use std::{
    io::{self, IsTerminal},
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use ayd_index::{DocumentChangeHandler, IngestOptions, watch};
use tracing::warn;

use crate::cli::{
    args::IngestCommand,
    context::CommandContext,
    output::{IngestProgress, ingest_summary, print_error, print_ingest_errors},
};

/// Ingests the given paths, then optionally keeps watching them.
pub fn run(ctx: &CommandContext, cmd: &IngestCommand) -> ExitCode {
    let palette = ctx.palette;
    let options = IngestOptions {
        include: cmd.include.clone(),
        exclude: cmd.exclude.clone(),
        force: cmd.force,
    };
    let mut ingestor = match ctx.ingestor() {
        Ok(ingestor) => ingestor,
        Err(code) => return code,
    };

    println!("{}", palette.header("Ingesting documents"));
    for path in &cmd.paths {
        println!("   {}", path.display());
    }
    println!();

    let mut progress = IngestProgress::new(io::stderr().is_terminal(), palette);
    let stats = match ingestor.ingest(&cmd.paths, &options, &mut progress) {
        Ok(stats) => stats,
        Err(e) => return print_error(&e, e.hint()),
    };

    println!("{}", ingest_summary(&stats));
    print_ingest_errors(&stats, palette);
    if stats.files_discovered == 0 {
        println!("{}", palette.warning("No supported documents found."));
    } else if stats.total_changes() == 0 {
        println!("{}", palette.dim("Collection is up to date."));
    } else {
        println!("{}", palette.success("Ingestion complete."));
    }

    if cmd.watch {
        println!();
        println!("{}", palette.subheader("Watching for changes (Ctrl-C to stop)..."));
        let mut handler = DocumentChangeHandler::from_config(&ctx.config.ingestion);
        let mut reporter = IngestProgress::for_watch(palette);
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
            warn!(error = %e, "failed to install Ctrl-C handler");
        }
        let watched = watch(&mut ingestor, &cmd.paths, &options, &mut handler, &mut reporter, &stop);
        if let Err(e) = watched {
            return print_error(&e, e.hint());
        }
    }

    if stats.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
