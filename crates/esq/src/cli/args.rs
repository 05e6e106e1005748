//! Clap argument definitions for the `esq` CLI.

use std::{env, path::PathBuf, process::exit};

use clap::{Args, CommandFactory, Parser, Subcommand, error::ErrorKind};

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "esq")]
#[command(about = "Compile boolean field:value queries into search-engine query documents")]
pub struct Cli {
    /// Load exactly this config file instead of discovering .esq.toml files
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v for debug logs, -vv for trace logs)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments for `esq compile`.
#[derive(Args, Debug, Clone)]
pub struct CompileCommand {
    /// Queries to compile
    #[arg(required = true)]
    pub queries: Vec<String>,

    /// Print each document on a single line
    #[arg(long)]
    pub compact: bool,
}

/// Arguments for `esq tokens`.
#[derive(Args, Debug, Clone)]
pub struct TokensCommand {
    /// Query to tokenize
    pub query: String,

    /// Output a JSON array of token strings
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `esq init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Create global ~/.esq.toml instead
    #[arg(long)]
    pub global: bool,

    /// Overwrite existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Supported `esq` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Compile queries and print the query documents as JSON
    #[command(after_help = "\
QUERY SYNTAX:
  field:value           Exact match on a field
  field:\"two words\"     Quoted value (spaces, dots, colons kept)
  a:1 AND b:2           Both conditions
  a:1 OR b:2            Either condition
  a:1 AND NOT b:2       Exclude a condition
  a:1 OR NOT b:2        Alternative exclusion
  (expr)                Grouping

NESTED RELATIONS:
  Fields starting with a configured prefix (see `esq relations`) are
  rewritten onto the relation's nested path and grouped into nested clauses.

EXAMPLES:
  esq compile 'owner:me'
  esq compile 'assignments.assignee_id:me AND assignments.is_completed:true'
  esq compile '(status:open OR status:pending) AND NOT owner:\"Jane Doe\"'")]
    Compile(CompileCommand),

    /// Print the token stream of a query
    Tokens(TokensCommand),

    /// Print the grouped tree of a query
    Tree {
        /// Query to group
        query: String,
    },

    /// Print the normalized form of a query
    Normalize {
        /// Query to normalize
        query: String,
    },

    /// List configured nested relations
    Relations,

    /// Initialize esq configuration in current directory
    Init(InitCommand),

    /// Validate configuration and diagnose issues
    Check,

    /// Show effective configuration settings
    Config,
}

/// Parses CLI arguments, printing flat help for top-level `--help`.
pub fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if e.kind() == ErrorKind::DisplayHelp {
                let args: Vec<_> = env::args().collect();
                if args.len() <= 2 {
                    print_overview_help();
                    exit(0);
                }
            }
            e.exit();
        }
    }
}

/// Prints top-level help with one line per subcommand.
fn print_overview_help() {
    let cmd = Cli::command();
    let about = cmd.get_about().map(|s| s.to_string()).unwrap_or_default();

    println!("{about}");
    println!();
    println!("Usage: esq [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");

    for sub in cmd.get_subcommands() {
        let name = sub.get_name();
        if name == "help" {
            continue;
        }
        let about = sub.get_about().map(|s| s.to_string()).unwrap_or_default();
        println!("  {name:10} {about}");
    }

    println!(
        "  {:<10} Print this message or the help of the given subcommand(s)",
        "help"
    );
    println!();
    println!("Options:");
    println!("      --config <PATH>  Load exactly this config file");
    println!("  -v, --verbose...     Increase log verbosity");
    println!("  -h, --help           Print help");
}
