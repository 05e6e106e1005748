//! Command implementations and dispatch.

pub mod check;
pub mod compile;
pub mod config;
pub mod init;
pub mod inspect;
pub mod relations;

use std::process::ExitCode;

use super::{args::Commands, context::CommandContext};

/// Dispatches to the selected subcommand.
pub fn run(command: Commands, ctx: &CommandContext) -> ExitCode {
    match command {
        Commands::Compile(cmd) => compile::run(ctx, &cmd),
        Commands::Tokens(cmd) => inspect::tokens(&cmd),
        Commands::Tree { query } => inspect::tree(ctx, &query),
        Commands::Normalize { query } => inspect::normalize(ctx, &query),
        Commands::Relations => relations::run(ctx),
        Commands::Init(cmd) => init::run(ctx, &cmd),
        Commands::Check => check::run(ctx),
        Commands::Config => config::run(ctx),
    }
}
