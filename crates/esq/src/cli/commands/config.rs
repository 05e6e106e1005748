//! Implementation of `esq config`.

use std::process::ExitCode;

use crate::cli::{
    context::CommandContext,
    output::{Language, print_source},
};

/// Shows effective configuration settings.
pub fn run(ctx: &CommandContext) -> ExitCode {
    print_source(&ctx.config.settings_to_toml(), Language::Toml);
    ExitCode::SUCCESS
}
