//! Implementation of `esq relations`.

use std::process::ExitCode;

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};

use crate::cli::{
    context::CommandContext,
    output::{dim, subheader},
};

/// Lists configured nested relations as a prefix -> path table, with the file defining each.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let config = &ctx.config;

    if config.relations.is_empty() {
        println!("{}", dim("No relations defined."));
        println!();
        println!(
            "Add [relation.NAME] sections to {} to group nested fields.",
            subheader(".esq.toml")
        );
        return ExitCode::SUCCESS;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Prefix", "Nested path", "Relation", "Scope", "Defined in"]);

    for relation in &config.relations {
        let scope = if relation.is_global { "global" } else { "local" };
        for prefix in &relation.prefixes {
            table.add_row(vec![
                Cell::new(format!("{prefix}.*")),
                Cell::new(&relation.path),
                Cell::new(&relation.name),
                Cell::new(scope),
                Cell::new(relation.source.display()),
            ]);
        }
    }

    println!("{table}");
    ExitCode::SUCCESS
}
