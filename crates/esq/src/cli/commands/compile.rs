//! Implementation of `esq compile`.

use std::process::ExitCode;

use tracing::debug;

use crate::cli::{
    args::CompileCommand,
    context::CommandContext,
    output::{print_json, print_query_error},
};

/// Compiles each query and prints its document.
///
/// Every query is attempted; the exit code is a failure if any of them failed.
pub fn run(ctx: &CommandContext, cmd: &CompileCommand) -> ExitCode {
    let compiler = ctx.config.compiler();
    let pretty = ctx.config.settings.pretty && !cmd.compact;
    let mut failed = false;

    for query in &cmd.queries {
        match compiler.compile_str(query) {
            Ok(doc) => {
                debug!(terms = doc.terms().len(), "compiled query");
                if let Err(e) = print_json(&doc, pretty) {
                    eprintln!("error: failed to serialize JSON: {e}");
                    return ExitCode::FAILURE;
                }
            }
            Err(e) => {
                print_query_error(&e);
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
