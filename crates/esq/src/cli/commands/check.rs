//! Implementation of `esq check`.

use std::process::ExitCode;

use esq_config::ConfigWarning;

use crate::cli::{
    context::CommandContext,
    output::{dim, subheader, warning},
};

/// Shows config files and relations, then reports validation warnings.
///
/// Exits with failure when any warning is reported.
pub fn run(ctx: &CommandContext) -> ExitCode {
    if ctx.config_files.is_empty() {
        println!("{}", dim("No configuration files found."));
        println!();
        println!(
            "Run {} to create a configuration file.",
            subheader("esq init")
        );
        return ExitCode::SUCCESS;
    }

    println!("{}", subheader("Config files:"));
    for path in &ctx.config_files {
        println!("   {}", path.display());
    }
    println!();

    let config = &ctx.config;

    println!("{}", subheader("Relations:"));
    if config.relations.is_empty() {
        println!("   {}", dim("(none defined)"));
    } else {
        for relation in &config.relations {
            let scope = if relation.is_global { "global" } else { "local" };
            println!(
                "   {} {} {}",
                relation.name,
                dim(&format!("({scope})")),
                dim(&format!("{} -> {}", relation.prefixes.join(", "), relation.path))
            );
            println!("      {}", dim(&format!("from {}", relation.source.display())));
        }
    }
    println!();

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("No issues found.");
        return ExitCode::SUCCESS;
    }

    println!("{}", subheader(&format!("Warnings ({}):", warnings.len())));
    for w in &warnings {
        println!("   {}", warning(&w.to_string()));
    }
    println!();

    print_hints(&warnings);

    ExitCode::FAILURE
}

/// Prints hints for resolving common warnings.
fn print_hints(warnings: &[ConfigWarning]) {
    let mut hints: Vec<&str> = warnings
        .iter()
        .map(|w| match w {
            ConfigWarning::NoRelationsDefined => {
                "Hint: add [relation.NAME] sections to .esq.toml"
            }
            ConfigWarning::PathEqualsPrefix { .. } => {
                "Hint: give the relation a distinct nested path, e.g. NAME_nested"
            }
            ConfigWarning::ShadowedPrefix { .. } => {
                "Hint: the longest matching prefix wins; rename one of the prefixes if that is unintended"
            }
        })
        .collect();
    hints.sort_unstable();
    hints.dedup();

    for hint in hints {
        println!("{}", dim(hint));
    }
}
