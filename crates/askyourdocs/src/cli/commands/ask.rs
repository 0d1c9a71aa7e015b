//! Implementation of `askyourdocs ask`.

use std::{
    io::{self, Write},
    process::ExitCode,
};

use ayd_query::{Answer, QueryEngine, QueryError, RetrieveOptions};

use super::shared::{join_words, retrieve_options_or_failure};
use crate::cli::{
    args::AskCommand,
    context::CommandContext,
    output::{print_answer_footer, print_error, print_json, print_sources},
};

/// Answers a single question.
pub fn run(ctx: &CommandContext, cmd: &AskCommand) -> ExitCode {
    let question = join_words(&cmd.question);
    let mut engine = match ctx.engine(cmd.model.as_deref()) {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    let options = match retrieve_options_or_failure(engine.default_options(), &cmd.retrieval) {
        Ok(options) => options,
        Err(code) => return code,
    };

    if cmd.json {
        return match engine.query_with(&question, &options, None) {
            Ok(answer) => print_json(&answer),
            Err(e) => print_query_error(&e),
        };
    }

    let stream = ctx.config.ui.streaming && !cmd.no_stream;
    let show_sources = ctx.config.ui.show_sources && !cmd.no_sources;
    match answer_and_print(&mut engine, &question, &options, stream) {
        Ok(answer) => {
            if show_sources {
                print_sources(&answer, ctx.palette);
            }
            print_answer_footer(&answer, ctx.palette);
            ExitCode::SUCCESS
        }
        Err(e) => print_query_error(&e),
    }
}

/// Answers `question`, printing the answer as it streams or once complete.
pub fn answer_and_print(
    engine: &mut QueryEngine,
    question: &str,
    options: &RetrieveOptions,
    stream: bool,
) -> Result<Answer, QueryError> {
    if !stream {
        let answer = engine.query_with(question, options, None)?;
        println!("{}", answer.answer);
        return Ok(answer);
    }

    let mut streamed = false;
    let mut on_token = |token: &str| {
        streamed = true;
        print!("{token}");
        if io::stdout().flush().is_err() {
            tracing::debug!("failed to flush stdout");
        }
    };
    let answer = engine.query_with(question, options, Some(&mut on_token))?;
    if streamed {
        println!();
    } else {
        println!("{}", answer.answer);
    }
    Ok(answer)
}

/// Prints a query failure with its hint.
pub fn print_query_error(error: &QueryError) -> ExitCode {
    print_error(error, error.hint())
}
