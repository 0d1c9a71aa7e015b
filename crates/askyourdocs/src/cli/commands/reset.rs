//! Implementation of `askyourdocs reset`.

use std::process::ExitCode;

use super::shared::confirm;
use crate::cli::{args::ConfirmArgs, context::CommandContext, output::print_error};

/// Deletes the collection after confirmation.
pub fn run(ctx: &CommandContext, args: ConfirmArgs) -> ExitCode {
    let palette = ctx.palette;
    let store = match ctx.store() {
        Ok(store) => store,
        Err(code) => return code,
    };
    let path = ctx.display_path(&store.storage_path());

    if !args.yes && !confirm(&format!("Delete the collection at {path}?")) {
        println!("Aborted.");
        return ExitCode::SUCCESS;
    }
    match store.reset() {
        Ok(()) => {
            println!("{} {path}", palette.success("Deleted collection"));
            ExitCode::SUCCESS
        }
        Err(e) => print_error(&e, e.hint()),
    }
}
