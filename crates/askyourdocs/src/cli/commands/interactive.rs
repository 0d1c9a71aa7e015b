//! Implementation of `askyourdocs interactive`.

use std::{
    io::{self, BufRead, Write},
    process::ExitCode,
};

use ayd_query::QueryError;

use super::{
    ask::{answer_and_print, print_query_error},
    shared::retrieve_options_or_failure,
};
use crate::cli::{
    args::InteractiveCommand,
    context::CommandContext,
    output::{print_answer_footer, print_error, print_sources},
};

/// Words that end the session.
const EXIT_WORDS: &[&str] = &["exit", "quit", ":q"];

/// Reads questions from stdin until `exit`, `quit` or end of input.
pub fn run(ctx: &CommandContext, cmd: &InteractiveCommand) -> ExitCode {
    let palette = ctx.palette;
    let mut engine = match ctx.engine(cmd.model.as_deref()) {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    let options = match retrieve_options_or_failure(engine.default_options(), &cmd.retrieval) {
        Ok(options) => options,
        Err(code) => return code,
    };
    if !engine.is_ready() {
        return print_query_error(&QueryError::NotReady);
    }

    println!("{}", palette.header("AskYourDocs interactive mode"));
    println!("{}", palette.dim("Type a question, or 'exit' to quit."));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n{} ", palette.subheader(">"));
        if let Err(e) = io::stdout().flush() {
            return print_error(&e, None);
        }
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => return print_error(&e, None),
            None => break,
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if EXIT_WORDS.iter().any(|w| question.eq_ignore_ascii_case(w)) {
            break;
        }

        match answer_and_print(&mut engine, question, &options, ctx.config.ui.streaming) {
            Ok(answer) => {
                if ctx.config.ui.show_sources {
                    print_sources(&answer, palette);
                }
                print_answer_footer(&answer, palette);
            }
            Err(e @ (QueryError::Invalid(_) | QueryError::EmptyQuestion)) => {
                println!("{}", palette.warning(&e.to_string()));
            }
            Err(e) => {
                print_query_error(&e);
            }
        }
    }

    println!();
    println!("{}", palette.dim("Goodbye."));
    ExitCode::SUCCESS
}
