//! Implementation of `askyourdocs similar`.

use std::process::ExitCode;

use ayd_query::{QueryError, SimilarDocument};
use serde::Serialize;

use super::{ask::print_query_error, shared::join_words};
use crate::cli::{
    args::SearchCommand,
    context::CommandContext,
    output::{print_error, print_json, similar_table},
};

/// JSON output for `similar`.
#[derive(Serialize)]
struct JsonSimilarOutput<'a> {
    /// The query text as given.
    query: &'a str,
    /// Documents, most similar first.
    results: &'a [SimilarDocument],
}

/// Prints the documents most similar to the given text.
pub fn run(ctx: &CommandContext, cmd: &SearchCommand) -> ExitCode {
    let query = join_words(&cmd.query);
    if query.is_empty() {
        return print_error(&"query text cannot be empty", None);
    }
    let mut engine = match ctx.retrieval_engine() {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    if !engine.is_ready() {
        return print_query_error(&QueryError::NotReady);
    }
    let docs = match engine.get_similar_documents(&query, cmd.limit) {
        Ok(docs) => docs,
        Err(e) => return print_query_error(&e),
    };

    if cmd.json {
        return print_json(&JsonSimilarOutput {
            query: &query,
            results: &docs,
        });
    }
    if docs.is_empty() {
        println!("{}", ctx.palette.dim("No similar documents found."));
        return ExitCode::SUCCESS;
    }
    println!("{}", similar_table(&docs));
    ExitCode::SUCCESS
}
