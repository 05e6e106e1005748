//! Boolean query compilation for esq.
//!
//! This crate compiles compact boolean query strings into search-engine query
//! documents:
//!
//! - **Terms**: `owner:me` - exact match on a field
//! - **Quoted values**: `email:"a.b@example.com"` - dots, colons, spaces kept verbatim
//! - **Operators**: `AND`, `OR`, `AND NOT`, `OR NOT` (case-sensitive)
//! - **Grouping**: `(a:1 OR b:2) AND c:3` - precedence control
//! - **Nested relations**: `assignments.assignee_id:me` - terms on one-to-many
//!   sub-documents are grouped into `nested` clauses
//!
//! The pipeline is [`tokenize`] → [`build_tree`] → [`Compiler`]; [`compile`]
//! runs all three.
//!
//! # Example
//!
//! ```
//! use esq_query::{RelationMap, compile};
//!
//! let relations = RelationMap::new().with("assignments", "assignments_nested");
//! let doc = compile(
//!     "assignments.assignee_id:me AND assignments.is_completed:true",
//!     &relations,
//! )
//! .unwrap();
//! assert_eq!(
//!     doc.to_json()["bool"]["must"][0]["nested"]["path"],
//!     "assignments_nested"
//! );
//! ```

#![warn(missing_docs)]

mod compile;
mod document;
mod error;
mod lexer;
mod resolve;
mod tree;

pub use compile::{Compiler, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT, compile};
pub use document::{BoolQuery, NestedQuery, Query, Role, TermQuery};
pub use error::{
    CompileError, QueryError, QueryErrorKind, ResolveError, TokenizeError, UnbalancedParenError,
};
pub use lexer::{Operator, Term, Token, render_tokens, tokenize};
pub use resolve::{NestedField, NestedResolver, NoRelations, RelationMap};
pub use tree::{Node, build_tree, render_nodes};
