//! Command-line interface for AskYourDocs.

use std::{
    io::{self, IsTerminal},
    process::ExitCode,
};

use askyourdocs::cli::{args::Cli, commands, logging};
use clap::Parser;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, !cli.no_color && io::stderr().is_terminal());
    commands::run(&cli)
}
