//! Query compiler.
//!
//! Compiles a grouped query tree into a boolean query document.
//!
//! Each sequence is split twice: first at the OR-family operators into
//! segments, then each segment at the AND-family operators into atoms. Every
//! atom gets a role from the operator in front of it and all atoms of one
//! sequence land in a single `bool` document:
//!
//! | position                                  | role         |
//! |-------------------------------------------|--------------|
//! | after `AND`                               | `must`       |
//! | after `AND NOT`                           | `must_not`   |
//! | first of a segment after `OR`             | `should`     |
//! | first of a segment after `OR NOT`         | `should_not` |
//! | first of the query, lone first segment    | `should`     |
//! | first of the query, otherwise             | `must`       |
//!
//! Terms of the same nested relation that share a role are then merged into a
//! single `nested` clause so they match within one related record.
//!
//! Merging only happens in sequences of two or more atoms. A nested term that
//! stands alone, whether as the whole query or alone inside a group such as
//! `(assignments.a:1) AND b:2`, gets its field rewritten to the nested path but
//! no `nested` wrapper.

use tracing::{debug, trace};

use crate::{
    document::{BoolQuery, NestedQuery, Query, Role},
    error::{CompileError, QueryError},
    lexer::{Operator, Term, tokenize},
    resolve::NestedResolver,
    tree::{Node, build_tree, render_nodes},
};

/// Default limit on group nesting.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Ceiling on any configured depth limit.
///
/// Trees, documents, and their renderings recurse once per level, so the
/// limit must stay well inside the stack.
pub const MAX_DEPTH_LIMIT: usize = 256;

/// Compiles query strings against a nested-relation resolver.
pub struct Compiler<R> {
    /// Nested relation lookup.
    resolver: R,
    /// Deepest group nesting accepted.
    max_depth: usize,
}

impl<R: NestedResolver> Compiler<R> {
    /// Creates a compiler using the default depth limit.
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the deepest group nesting accepted, capped at [`MAX_DEPTH_LIMIT`].
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.min(MAX_DEPTH_LIMIT);
        self
    }

    /// Returns the configured depth limit.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Tokenizes, groups, and compiles a query string.
    pub fn compile_str(&self, input: &str) -> Result<Query, QueryError> {
        debug!(query = input, "compiling query");
        let tokens = tokenize(input)?;
        let nodes = build_tree(tokens, self.max_depth).map_err(|e| e.with_query(input))?;
        self.compile_nodes(&nodes).map_err(|e| e.with_query(input))
    }

    /// Compiles a top-level sequence produced by [`build_tree`].
    pub fn compile_nodes(&self, nodes: &[Node]) -> Result<Query, QueryError> {
        if nodes.is_empty() {
            return Err(CompileError::new("empty query").into());
        }
        self.compile_sequence(nodes, 0).map(Query::Bool)
    }

    /// Compiles one sequence into a `bool` document.
    fn compile_sequence(&self, nodes: &[Node], depth: usize) -> Result<BoolQuery, QueryError> {
        if depth > self.max_depth {
            return Err(CompileError::too_deep(self.max_depth).into());
        }
        validate_sequence(nodes)?;

        let atoms = assign_roles(nodes);
        trace!(
            depth,
            roles = ?atoms.iter().map(|(role, _)| role.as_str()).collect::<Vec<_>>(),
            "assigned roles"
        );

        let mut clauses = Vec::with_capacity(atoms.len());
        for (role, node) in atoms {
            clauses.push(self.compile_atom(role, node, depth)?);
        }

        let lone_atom = clauses.len() == 1;
        let doc = assemble(clauses, !lone_atom);
        Ok(if lone_atom { unwrap_lone_bool(doc) } else { doc })
    }

    /// Compiles a term or a sub-group into a clause.
    fn compile_atom(&self, role: Role, node: &Node, depth: usize) -> Result<Clause, QueryError> {
        match node {
            Node::Term(term) => self.compile_term(role, term),
            Node::Group(inner) => Ok(Clause {
                role,
                query: Query::Bool(self.compile_sequence(inner, depth + 1)?),
                path: None,
            }),
            Node::Op(op) => Err(CompileError::new(format!("unexpected operator {op}")).into()),
        }
    }

    /// Resolves a term's field, recording its nested path if it has one.
    fn compile_term(&self, role: Role, term: &Term) -> Result<Clause, QueryError> {
        let clause = match self.resolver.resolve(&term.field)? {
            Some(nested) => Clause {
                role,
                query: Query::term(nested.field, term.value.as_str()),
                path: Some(nested.path),
            },
            None => Clause {
                role,
                query: Query::term(term.field.as_str(), term.value.as_str()),
                path: None,
            },
        };
        Ok(clause)
    }
}

/// Compiles a query string with the default depth limit.
pub fn compile<R: NestedResolver>(input: &str, resolver: R) -> Result<Query, QueryError> {
    Compiler::new(resolver).compile_str(input)
}

/// A compiled atom awaiting placement into a role bucket.
struct Clause {
    /// Role taken from the surrounding operators.
    role: Role,
    /// Compiled term or sub-group document.
    query: Query,
    /// Nested path of the term, if its field belongs to a relation.
    path: Option<String>,
}

/// A bucket entry while nested clauses are still being merged.
enum Slot {
    /// A finished clause.
    Plain(Query),
    /// Terms of one relation collected under one nested clause.
    Nested {
        /// Nested path name.
        path: String,
        /// Inner document.
        query: BoolQuery,
    },
}

impl Slot {
    /// Converts the slot into its final document.
    fn into_query(self) -> Query {
        match self {
            Self::Plain(query) => query,
            Self::Nested { path, query } => Query::Nested(NestedQuery {
                path,
                query: Box::new(Query::Bool(query)),
            }),
        }
    }
}

/// Places clauses into role buckets, merging terms of one relation per role.
fn assemble(clauses: Vec<Clause>, group_nested: bool) -> BoolQuery {
    let mut buckets: [Vec<Slot>; 4] = Default::default();

    for clause in clauses {
        let bucket = &mut buckets[bucket_index(clause.role)];
        match clause.path {
            Some(path) if group_nested => {
                let inner_role = clause.role.affirmative();
                let existing = bucket.iter_mut().find_map(|slot| match slot {
                    Slot::Nested { path: p, query } if *p == path => Some(query),
                    _ => None,
                });
                if let Some(query) = existing {
                    debug!(path = %path, role = clause.role.as_str(), "merged nested term");
                    query.push(inner_role, clause.query);
                } else {
                    let mut query = BoolQuery::default();
                    query.push(inner_role, clause.query);
                    bucket.push(Slot::Nested { path, query });
                }
            }
            _ => bucket.push(Slot::Plain(clause.query)),
        }
    }

    let mut doc = BoolQuery::default();
    for (role, slots) in Role::ALL.into_iter().zip(buckets) {
        doc.bucket_mut(role)
            .extend(slots.into_iter().map(Slot::into_query));
    }
    doc
}

/// Position of a role's bucket in [`Role::ALL`].
fn bucket_index(role: Role) -> usize {
    match role {
        Role::Must => 0,
        Role::Should => 1,
        Role::MustNot => 2,
        Role::ShouldNot => 3,
    }
}

/// Returns the inner document when the only clause is itself a `bool` document.
fn unwrap_lone_bool(mut doc: BoolQuery) -> BoolQuery {
    if let Some((role, Query::Bool(_))) = doc.single_clause()
        && let Some(Query::Bool(inner)) = doc.bucket_mut(role).pop()
    {
        return inner;
    }
    doc
}

/// A run of atoms between OR-family operators.
struct Segment<'a> {
    /// Operator that opened this segment (`None` for the first).
    lead: Option<Operator>,
    /// Atoms with the AND-family operator preceding each.
    atoms: Vec<(Option<Operator>, &'a Node)>,
}

/// Splits a validated sequence and assigns each atom its role.
fn assign_roles(nodes: &[Node]) -> Vec<(Role, &Node)> {
    let mut segments = vec![Segment {
        lead: None,
        atoms: Vec::new(),
    }];
    let mut pending = None;

    for node in nodes {
        match node {
            Node::Op(op) if op.is_disjunctive() => segments.push(Segment {
                lead: Some(*op),
                atoms: Vec::new(),
            }),
            Node::Op(op) => pending = Some(*op),
            operand => {
                if let Some(segment) = segments.last_mut() {
                    segment.atoms.push((pending.take(), operand));
                }
            }
        }
    }

    let multi_segment = segments.len() > 1;
    let mut roles = Vec::new();
    for segment in &segments {
        for (i, (op, node)) in segment.atoms.iter().enumerate() {
            let role = if i == 0 {
                match segment.lead {
                    Some(Operator::OrNot) => Role::ShouldNot,
                    Some(_) => Role::Should,
                    None if multi_segment && segment.atoms.len() == 1 => Role::Should,
                    None => Role::Must,
                }
            } else if *op == Some(Operator::AndNot) {
                Role::MustNot
            } else {
                Role::Must
            };
            roles.push((role, *node));
        }
    }
    roles
}

/// Checks that operators and operands alternate, starting and ending with an operand.
fn validate_sequence(nodes: &[Node]) -> Result<(), CompileError> {
    let (Some(first), Some(last)) = (nodes.first(), nodes.last()) else {
        return Err(CompileError::new("empty group"));
    };
    if let Node::Op(op) = first {
        return Err(CompileError::new(format!("query begins with operator {op}")));
    }
    if let Node::Op(op) = last {
        return Err(CompileError::new(format!("query ends with operator {op}")));
    }

    for pair in nodes.windows(2) {
        match (&pair[0], &pair[1]) {
            (Node::Op(a), Node::Op(b)) => {
                return Err(CompileError::new(format!("adjacent operators {a} and {b}")));
            }
            (a, b) if !a.is_op() && !b.is_op() => {
                return Err(CompileError::new(format!(
                    "missing operator between {} and {}",
                    describe(a),
                    describe(b)
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Short description of an operand for error messages.
fn describe(node: &Node) -> String {
    match node {
        Node::Group(nodes) => format!("({})", render_nodes(nodes)),
        Node::Term(term) => format!("'{term}'"),
        Node::Op(op) => op.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::resolve::{NoRelations, RelationMap};

    fn relations() -> RelationMap {
        RelationMap::new().with("assignments", "assignments_nested")
    }

    fn compiled(input: &str) -> serde_json::Value {
        compile(input, &relations()).unwrap().to_json()
    }

    fn roles(input: &str) -> Vec<Role> {
        let nodes = build_tree(tokenize(input).unwrap(), DEFAULT_MAX_DEPTH).unwrap();
        assign_roles(&nodes).into_iter().map(|(r, _)| r).collect()
    }

    #[test]
    fn lone_term_is_must() {
        assert_eq!(compiled("a:1"), json!({"bool": {"must": [{"term": {"a": "1"}}]}}));
    }

    #[test]
    fn roles_follow_preceding_operator() {
        use Role::*;
        assert_eq!(roles("a:1 AND b:2"), vec![Must, Must]);
        assert_eq!(roles("a:1 OR b:2"), vec![Should, Should]);
        assert_eq!(roles("a:1 AND NOT b:2"), vec![Must, MustNot]);
        assert_eq!(roles("a:1 OR NOT b:2"), vec![Should, ShouldNot]);
        assert_eq!(roles("a:1 OR b:2 AND c:3"), vec![Should, Should, Must]);
        assert_eq!(roles("a:1 AND b:2 OR c:3"), vec![Must, Must, Should]);
        assert_eq!(
            roles("a:1 OR b:2 AND NOT c:3 OR NOT d:4"),
            vec![Should, Should, MustNot, ShouldNot]
        );
    }

    #[test]
    fn flat_or() {
        assert_eq!(
            compiled("a:1 OR b:2"),
            json!({"bool": {"should": [{"term": {"a": "1"}}, {"term": {"b": "2"}}]}})
        );
    }

    #[test]
    fn or_not_emits_should_not() {
        assert_eq!(
            compiled("complicated:true OR NOT complicated:false"),
            json!({"bool": {
                "should": [{"term": {"complicated": "true"}}],
                "should_not": [{"term": {"complicated": "false"}}],
            }})
        );
    }

    #[test]
    fn lone_nested_term_is_not_wrapped() {
        assert_eq!(
            compiled("assignments.assignee_id:someuser"),
            json!({"bool": {"must": [{"term": {"assignments_nested.assignee_id": "someuser"}}]}})
        );
    }

    #[test]
    fn lone_nested_term_in_group_is_not_wrapped() {
        assert_eq!(
            compiled("(assignments.a:1) AND b:2"),
            json!({"bool": {"must": [
                {"bool": {"must": [{"term": {"assignments_nested.a": "1"}}]}},
                {"term": {"b": "2"}},
            ]}})
        );
    }

    #[test]
    fn single_nested_term_among_others_is_wrapped() {
        assert_eq!(
            compiled("a:1 AND assignments.x:2"),
            json!({"bool": {"must": [
                {"term": {"a": "1"}},
                {"nested": {"path": "assignments_nested", "query": {"bool": {
                    "must": [{"term": {"assignments_nested.x": "2"}}]
                }}}},
            ]}})
        );
    }

    #[test]
    fn nested_or_uses_should_inside() {
        assert_eq!(
            compiled("assignments.a:1 OR assignments.b:2 OR owner:me"),
            json!({"bool": {"should": [
                {"nested": {"path": "assignments_nested", "query": {"bool": {
                    "should": [
                        {"term": {"assignments_nested.a": "1"}},
                        {"term": {"assignments_nested.b": "2"}},
                    ]
                }}}},
                {"term": {"owner": "me"}},
            ]}})
        );
    }

    #[test]
    fn nested_slot_keeps_first_position() {
        assert_eq!(
            compiled("assignments.a:1 AND owner:me AND assignments.b:2"),
            json!({"bool": {"must": [
                {"nested": {"path": "assignments_nested", "query": {"bool": {
                    "must": [
                        {"term": {"assignments_nested.a": "1"}},
                        {"term": {"assignments_nested.b": "2"}},
                    ]
                }}}},
                {"term": {"owner": "me"}},
            ]}})
        );
    }

    #[test]
    fn distinct_relations_stay_separate() {
        let map = relations().with("tags", "tags_nested");
        let doc = compile("assignments.a:1 AND tags.name:x", &map).unwrap();
        let Query::Bool(b) = doc else { panic!("expected bool") };
        assert_eq!(b.must.len(), 2);
        assert!(b.must.iter().all(|q| matches!(q, Query::Nested(_))));
    }

    #[test]
    fn group_unwraps_when_alone() {
        assert_eq!(compiled("(a:1 OR b:2)"), compiled("a:1 OR b:2"));
        assert_eq!(compiled("((a:1 OR b:2))"), compiled("a:1 OR b:2"));
        assert_eq!(compiled("(a:1)"), compiled("a:1"));
    }

    #[test]
    fn group_is_an_atom_among_siblings() {
        assert_eq!(
            compiled("(a:1 OR b:2) AND c:3"),
            json!({"bool": {"must": [
                {"bool": {"should": [{"term": {"a": "1"}}, {"term": {"b": "2"}}]}},
                {"term": {"c": "3"}},
            ]}})
        );
    }

    #[test]
    fn flat_resolver_ignores_dots() {
        let doc = compile("assignments.a:1 AND assignments.b:2", NoRelations).unwrap();
        assert_eq!(
            doc.to_json(),
            json!({"bool": {"must": [
                {"term": {"assignments.a": "1"}},
                {"term": {"assignments.b": "2"}},
            ]}})
        );
    }

    #[test]
    fn empty_query_is_rejected() {
        let err = compile("   ", NoRelations).unwrap_err();
        assert_eq!(err.message(), "empty query");
    }

    #[test]
    fn empty_group_is_rejected() {
        let err = compile("a:1 AND ()", NoRelations).unwrap_err();
        assert_eq!(err.message(), "empty group");
    }

    #[test]
    fn trailing_operator_is_rejected() {
        let err = compile("a:1 AND", NoRelations).unwrap_err();
        assert!(err.message().contains("ends with operator AND"));
        let err = compile("(a:1 OR NOT) AND b:2", NoRelations).unwrap_err();
        assert!(err.message().contains("ends with operator OR NOT"));
    }

    #[test]
    fn missing_operator_is_rejected() {
        let err = compile("a:1 b:2", NoRelations).unwrap_err();
        assert!(err.message().contains("missing operator between 'a:1' and 'b:2'"));
        assert_eq!(err.query.as_deref(), Some("a:1 b:2"));
    }

    #[test]
    fn depth_limit() {
        let compiler = Compiler::new(NoRelations).with_max_depth(2);
        assert!(compiler.compile_str("((a:1))").is_ok());
        let err = compiler.compile_str("(((a:1)))").unwrap_err();
        assert!(err.message().contains("deeper than the maximum of 2"));
    }

    #[test]
    fn depth_limit_is_capped() {
        let compiler = Compiler::new(NoRelations).with_max_depth(usize::MAX);
        assert_eq!(compiler.max_depth(), MAX_DEPTH_LIMIT);
    }

    #[test]
    fn deep_input_fails_cleanly() {
        let depth = 100_000;
        let nested = format!("{}a:1{}", "(".repeat(depth), ")".repeat(depth));
        for query in [nested.clone(), format!("a:1 {nested}"), format!("a:1 AND {nested}")] {
            let err = compile(&query, NoRelations).unwrap_err();
            assert!(err.message().contains("deeper than the maximum of 32"));
        }

        let compiler = Compiler::new(NoRelations).with_max_depth(usize::MAX);
        let err = compiler.compile_str(&nested).unwrap_err();
        assert!(err.message().contains("deeper than the maximum of 256"));
    }

    #[test]
    fn deep_unclosed_input_fails_cleanly() {
        let query = format!("a:1 {}", "(".repeat(100_000));
        assert!(compile(&query, NoRelations).is_err());
    }
}
