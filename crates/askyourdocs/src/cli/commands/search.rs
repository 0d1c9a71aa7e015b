//! Implementation of `askyourdocs search`.

use std::process::ExitCode;

use ayd_query::KeywordHit;
use serde::Serialize;

use super::{ask::print_query_error, shared::join_words};
use crate::cli::{
    args::SearchCommand,
    context::CommandContext,
    output::{keyword_table, print_error, print_json},
};

/// JSON output for `search`.
#[derive(Serialize)]
struct JsonSearchOutput<'a> {
    /// The query as given.
    query: &'a str,
    /// Matching chunks, best first.
    results: &'a [KeywordHit],
}

/// Prints the chunks best matching the query terms.
pub fn run(ctx: &CommandContext, cmd: &SearchCommand) -> ExitCode {
    let query = join_words(&cmd.query);
    if query.is_empty() {
        return print_error(&"search query cannot be empty", None);
    }
    let engine = match ctx.retrieval_engine() {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    let hits = match engine.keyword_search(&query, cmd.limit) {
        Ok(hits) => hits,
        Err(e) => return print_query_error(&e),
    };

    if cmd.json {
        return print_json(&JsonSearchOutput {
            query: &query,
            results: &hits,
        });
    }
    if hits.is_empty() {
        let message = if engine.is_ready() {
            "No results found."
        } else {
            "The collection is empty. Run 'askyourdocs ingest <path>' first."
        };
        println!("{}", ctx.palette.dim(message));
        return ExitCode::SUCCESS;
    }
    println!("{}", keyword_table(&hits));
    ExitCode::SUCCESS
}
