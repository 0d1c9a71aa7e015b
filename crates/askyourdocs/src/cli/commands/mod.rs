//! Command implementations and dispatch.

pub mod ask;
pub mod config;
pub mod ingest;
pub mod interactive;
pub mod refresh;
pub mod reset;
pub mod search;
mod shared;
pub mod similar;
pub mod status;

use std::process::ExitCode;

use super::{
    args::{Cli, Commands, ConfigAction},
    context::CommandContext,
};

/// Builds the command context and dispatches to the selected subcommand.
pub fn run(cli: &Cli) -> ExitCode {
    let ctx = match &cli.command {
        Commands::Config {
            action: ConfigAction::Reset(_) | ConfigAction::Path,
        } => CommandContext::load_without_config(cli),
        _ => CommandContext::load(cli),
    };
    let ctx = match ctx {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    match &cli.command {
        Commands::Ingest(cmd) => ingest::run(&ctx, cmd),
        Commands::Ask(cmd) => ask::run(&ctx, cmd),
        Commands::Search(cmd) => search::run(&ctx, cmd),
        Commands::Similar(cmd) => similar::run(&ctx, cmd),
        Commands::Interactive(cmd) => interactive::run(&ctx, cmd),
        Commands::Status => status::run(&ctx),
        Commands::Config { action } => config::run(&ctx, action),
        Commands::Refresh(cmd) => refresh::run(&ctx, *cmd),
        Commands::Reset(cmd) => reset::run(&ctx, *cmd),
    }
}
