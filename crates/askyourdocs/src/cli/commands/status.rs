//! Implementation of `askyourdocs status`.

use std::process::ExitCode;

use ayd_index::IndexStatus;

use crate::cli::{context::CommandContext, output::storage_table};

/// Shows collection statistics, index health and the active configuration.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let palette = ctx.palette;
    let config = &ctx.config;

    println!("{}", palette.header("AskYourDocs Status"));
    println!();

    let store = match ctx.store() {
        Ok(store) => store,
        Err(code) => return code,
    };
    match store.get_stats() {
        Ok(stats) => {
            println!("{}", storage_table(&stats));
            if stats.chunk_count == 0 {
                println!(
                    "{}",
                    palette.dim("No documents ingested yet. Run 'askyourdocs ingest <path>'.")
                );
            }
        }
        Err(e) => println!("{}", palette.warning(&format!("could not read collection: {e}"))),
    }
    println!();

    let status = store.index_status();
    let rendered = match status {
        IndexStatus::Current => palette.success(status.description()),
        IndexStatus::ConfigChanged | IndexStatus::Missing => palette.warning(status.description()),
    };
    println!("{} {rendered}", palette.subheader("Index:"));
    if status == IndexStatus::ConfigChanged {
        println!(
            "   {}",
            palette.dim("Run 'askyourdocs refresh --full' to rebuild with the current settings.")
        );
    }
    println!();

    println!("{}", palette.subheader("Config files (highest precedence first):"));
    for path in &config.sources {
        let marker = if path.exists() { "" } else { " (missing)" };
        println!("   {}{}", ctx.display_path(path), palette.dim(marker));
    }
    println!();

    println!("{}", palette.subheader("Models:"));
    println!(
        "   LLM:        {} {}",
        config.model.name,
        palette.dim(&format!("({})", config.model.provider))
    );
    println!(
        "   Embeddings: {} {}",
        config.embedding.model,
        palette.dim(&format!("({})", config.embedding.provider))
    );
    println!(
        "   Retrieval:  {} {}",
        config.retrieval.retrieval_mode,
        palette.dim(&format!(
            "(top_k {}, threshold {})",
            config.retrieval.top_k, config.retrieval.similarity_threshold
        ))
    );

    ExitCode::SUCCESS
}
