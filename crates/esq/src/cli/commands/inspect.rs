//! Implementations of `esq tokens`, `esq tree`, and `esq normalize`.
//!
//! These expose the intermediate stages of compilation so a query can be
//! debugged without a configured relation registry. Grouping still honors the
//! configured depth limit.

use std::process::ExitCode;

use esq_query::{Node, QueryError, Token, build_tree, render_nodes, tokenize};

use crate::cli::{
    args::TokensCommand,
    context::CommandContext,
    output::{dim, print_json, print_query_error},
};

/// Prints the token stream of a query.
pub fn tokens(cmd: &TokensCommand) -> ExitCode {
    let tokens = match tokenize(&cmd.query) {
        Ok(tokens) => tokens,
        Err(e) => {
            print_query_error(&QueryError::from(e));
            return ExitCode::FAILURE;
        }
    };

    if cmd.json {
        let rendered: Vec<String> = tokens.iter().map(Token::to_string).collect();
        if let Err(e) = print_json(&rendered, true) {
            eprintln!("error: failed to serialize JSON: {e}");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    if tokens.is_empty() {
        println!("{}", dim("(no tokens)"));
    }
    for token in &tokens {
        println!("{}", describe_token(token));
    }
    ExitCode::SUCCESS
}

/// Prints the grouped tree of a query.
pub fn tree(ctx: &CommandContext, query: &str) -> ExitCode {
    let nodes = match group(query, ctx.config.settings.max_depth) {
        Ok(nodes) => nodes,
        Err(e) => {
            print_query_error(&e);
            return ExitCode::FAILURE;
        }
    };

    if nodes.is_empty() {
        println!("{}", dim("(empty)"));
    }
    for node in &nodes {
        print!("{node}");
    }
    ExitCode::SUCCESS
}

/// Prints the normalized query string.
pub fn normalize(ctx: &CommandContext, query: &str) -> ExitCode {
    match group(query, ctx.config.settings.max_depth) {
        Ok(nodes) => {
            println!("{}", render_nodes(&nodes));
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_query_error(&e);
            ExitCode::FAILURE
        }
    }
}

/// Tokenizes and groups a query, attaching the query to any error.
fn group(query: &str, max_depth: usize) -> Result<Vec<Node>, QueryError> {
    let tokens = tokenize(query)?;
    build_tree(tokens, max_depth).map_err(|e| e.with_query(query))
}

/// One-line description of a token, labelled by kind.
fn describe_token(token: &Token) -> String {
    match token {
        Token::Term(term) => format!("TERM   {} = {}", term.field, term.value),
        Token::Op(op) => format!("OP     {op}"),
        Token::GroupOpen => "OPEN   (".to_string(),
        Token::GroupClose => "CLOSE  )".to_string(),
    }
}
