//! Shared helpers for command implementations.

use std::{
    io::{self, BufRead, Write},
    process::ExitCode,
};

use ayd_config::{validate_similarity_threshold, validate_top_k};
use ayd_query::RetrieveOptions;

use crate::cli::{args::RetrievalArgs, output::print_error};

/// Applies CLI overrides to the configured retrieval options.
///
/// Overrides go through the same validators as the configuration file.
pub fn retrieve_options(
    defaults: RetrieveOptions,
    args: &RetrievalArgs,
) -> Result<RetrieveOptions, String> {
    let mut options = defaults;
    if let Some(top_k) = args.top_k {
        validate_top_k(top_k)?;
        options.top_k = usize::try_from(top_k).map_err(|e| e.to_string())?;
    }
    if let Some(threshold) = args.threshold {
        validate_similarity_threshold(threshold)?;
        options.threshold = threshold;
    }
    if let Some(mode) = args.mode {
        options.mode = mode;
    }
    Ok(options)
}

/// Like [`retrieve_options`], printing the error.
pub fn retrieve_options_or_failure(
    defaults: RetrieveOptions,
    args: &RetrievalArgs,
) -> Result<RetrieveOptions, ExitCode> {
    retrieve_options(defaults, args).map_err(|e| print_error(&e, None))
}

/// Joins the words of a multi-word argument.
pub fn join_words(words: &[String]) -> String {
    words.join(" ").trim().to_string()
}

/// Asks a yes/no question on stdin. Anything but "y" or "yes" means no.
pub fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
