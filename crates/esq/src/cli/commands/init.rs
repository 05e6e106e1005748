//! Implementation of `esq init`.

use std::{fs, path::PathBuf, process::ExitCode};

use esq_config::{
    CONFIG_FILENAME, ConfigError, global_template, is_global_config, local_template,
    require_global_config_path,
};

use crate::cli::{
    args::InitCommand,
    context::CommandContext,
    output::{Language, print_source},
};

/// Writes a starter `.esq.toml` into the working directory, or `~/.esq.toml` with `--global`.
pub fn run(ctx: &CommandContext, cmd: &InitCommand) -> ExitCode {
    let (path, template) = match target(ctx, cmd.global) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if path.exists() && !cmd.force {
        eprintln!(
            "error: {} already exists (use --force to overwrite)",
            path.display()
        );
        return ExitCode::FAILURE;
    }
    if let Err(e) = fs::write(&path, &template) {
        eprintln!("error: failed to write {}: {e}", path.display());
        return ExitCode::FAILURE;
    }

    println!("Created {}", path.display());
    print_source(&template, Language::Toml);
    ExitCode::SUCCESS
}

/// The file to create and its contents.
///
/// A local file in the home directory would be the global config, so it gets
/// the global template.
fn target(ctx: &CommandContext, global: bool) -> Result<(PathBuf, String), ConfigError> {
    let local = ctx.cwd.join(CONFIG_FILENAME);
    if global || is_global_config(&local) {
        Ok((require_global_config_path()?, global_template()))
    } else {
        Ok((local, local_template()))
    }
}
