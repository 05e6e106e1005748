//! esq: boolean query compiler.
//!
//! Compiles compact `field:value` boolean queries into search-engine query
//! documents, grouping conditions on one-to-many relations into `nested`
//! clauses according to the relations declared in `.esq.toml`.

#![warn(missing_docs)]

mod cli;

use std::{io, process::ExitCode};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::{
    CommandContext,
    args::{Commands, parse_cli},
    commands,
};

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "ESQ_LOG";

fn main() -> ExitCode {
    let cli = parse_cli();
    setup_tracing(cli.verbose);

    let ctx = match &cli.command {
        Commands::Init(_) => CommandContext::load_cwd_only(),
        _ => CommandContext::load(cli.config.as_deref()),
    };
    let ctx = match ctx {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    commands::run(cli.command, &ctx)
}

/// Installs a stderr subscriber filtered by `ESQ_LOG`, falling back to the `-v` count.
fn setup_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
