//! Grouping of tokens by parenthesization.
//!
//! The tree mirrors the parentheses of the query and nothing else: operators
//! stay in place inside each group, and precedence is left to the compiler.

use std::fmt;

use tracing::trace;

use crate::{
    error::{CompileError, QueryError, UnbalancedParenError},
    lexer::{Operator, Term, Token},
};

/// A node of the grouped query tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A `field:value` condition.
    Term(Term),

    /// An operator between two siblings.
    Op(Operator),

    /// A parenthesized span.
    Group(Vec<Self>),
}

impl Node {
    /// Creates a group node.
    pub fn group(nodes: Vec<Self>) -> Self {
        Self::Group(nodes)
    }

    /// Returns true if this node is an operator.
    pub fn is_op(&self) -> bool {
        matches!(self, Self::Op(_))
    }

    /// Formats the node as a tree structure with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::Term(term) => writeln!(f, "{prefix}Term({term})"),
            Self::Op(op) => writeln!(f, "{prefix}{op}"),
            Self::Group(nodes) => {
                writeln!(f, "{prefix}Group")?;
                for node in nodes {
                    node.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
        }
    }

    /// Appends the query string form of this node to `out`.
    fn write_query_string(&self, out: &mut String) {
        match self {
            Self::Term(term) => out.push_str(&term.to_string()),
            Self::Op(op) => out.push_str(op.as_str()),
            Self::Group(nodes) => {
                out.push('(');
                out.push_str(&render_nodes(nodes));
                out.push(')');
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

/// Groups a token stream by its parentheses.
///
/// Returns the top-level sequence. Every `(` pushes a new sequence and every
/// `)` closes the innermost one into its parent. A `(` that would open a group
/// deeper than `max_depth` fails immediately, so the returned tree is never
/// deeper than the limit.
pub fn build_tree(tokens: Vec<Token>, max_depth: usize) -> Result<Vec<Node>, QueryError> {
    let mut stack: Vec<(Vec<Node>, usize)> = Vec::new();
    let mut current: Vec<Node> = Vec::new();

    for (index, token) in tokens.into_iter().enumerate() {
        match token {
            Token::GroupOpen => {
                if stack.len() >= max_depth {
                    return Err(CompileError::too_deep(max_depth).into());
                }
                stack.push((current, index));
                current = Vec::new();
            }
            Token::GroupClose => {
                let Some((mut parent, _)) = stack.pop() else {
                    return Err(UnbalancedParenError::new(
                        "unexpected closing parenthesis",
                        Some(index),
                    )
                    .into());
                };
                parent.push(Node::Group(current));
                current = parent;
            }
            Token::Term(term) => current.push(Node::Term(term)),
            Token::Op(op) => current.push(Node::Op(op)),
        }
    }

    if let Some((_, open_index)) = stack.last() {
        return Err(UnbalancedParenError::new(
            "unclosed group (missing closing parenthesis)",
            Some(*open_index),
        )
        .into());
    }

    trace!(nodes = current.len(), "built query tree");
    Ok(current)
}

/// Renders a sequence of nodes as a normalized query string.
pub fn render_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        node.write_query_string(&mut out);
    }
    out
}
