//! Compiled query documents.
//!
//! These types serialize to the boolean query DSL: `{"term": {field: value}}`,
//! `{"nested": {"path": .., "query": ..}}` and `{"bool": {"must": [..], ..}}`.

use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::Value;

/// Boolean role of a clause inside a `bool` document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Required (`AND`).
    Must,
    /// Alternative (`OR`).
    Should,
    /// Excluded (`AND NOT`).
    MustNot,
    /// Negated alternative (`OR NOT`).
    ///
    /// Mainstream search engines do not define `should_not`; it is emitted
    /// as-is and its effect depends on the engine receiving the document.
    ShouldNot,
}

impl Role {
    /// All roles in output order.
    pub const ALL: [Self; 4] = [Self::Must, Self::Should, Self::MustNot, Self::ShouldNot];

    /// Key used for this role in a `bool` document.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Must => "must",
            Self::Should => "should",
            Self::MustNot => "must_not",
            Self::ShouldNot => "should_not",
        }
    }

    /// The affirmative role used inside a nested clause built from this bucket.
    pub fn affirmative(self) -> Self {
        match self {
            Self::Must | Self::MustNot => Self::Must,
            Self::Should | Self::ShouldNot => Self::Should,
        }
    }
}

/// A compiled query document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// Exact match on one field.
    Term(TermQuery),
    /// Query over the sub-documents of a nested relation.
    Nested(NestedQuery),
    /// Boolean combination of clauses.
    Bool(BoolQuery),
}

impl Query {
    /// Creates a term query.
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Term(TermQuery {
            field: field.into(),
            value: value.into(),
        })
    }

    /// Converts the document to a JSON value.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).expect("query documents always serialize")
    }

    /// Collects every leaf term in document order.
    pub fn terms(&self) -> Vec<&TermQuery> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a TermQuery>) {
        match self {
            Self::Term(term) => out.push(term),
            Self::Nested(nested) => nested.query.collect_terms(out),
            Self::Bool(bool_query) => {
                for role in Role::ALL {
                    for clause in bool_query.bucket(role) {
                        clause.collect_terms(out);
                    }
                }
            }
        }
    }
}

/// An exact-match condition, serialized as `{field: value}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermQuery {
    /// Field name (nested-qualified when inside a nested relation).
    pub field: String,
    /// Value to match.
    pub value: String,
}

impl Serialize for TermQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.value)?;
        map.end()
    }
}

/// A query scoped to one nested path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedQuery {
    /// Nested path name.
    pub path: String,
    /// Query evaluated against each sub-document.
    pub query: Box<Query>,
}

/// Boolean document with up to four role buckets. Empty buckets are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoolQuery {
    /// Clauses that must match.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Query>,
    /// Clauses that should match.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Query>,
    /// Clauses that must not match.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<Query>,
    /// Negated alternatives.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should_not: Vec<Query>,
}

impl BoolQuery {
    /// Returns the clauses of one role.
    pub fn bucket(&self, role: Role) -> &[Query] {
        match role {
            Role::Must => &self.must,
            Role::Should => &self.should,
            Role::MustNot => &self.must_not,
            Role::ShouldNot => &self.should_not,
        }
    }

    /// Returns the clauses of one role for modification.
    pub fn bucket_mut(&mut self, role: Role) -> &mut Vec<Query> {
        match role {
            Role::Must => &mut self.must,
            Role::Should => &mut self.should,
            Role::MustNot => &mut self.must_not,
            Role::ShouldNot => &mut self.should_not,
        }
    }

    /// Appends a clause under `role`.
    pub fn push(&mut self, role: Role, query: Query) {
        self.bucket_mut(role).push(query);
    }

    /// Total number of clauses across all buckets.
    pub fn len(&self) -> usize {
        Role::ALL.iter().map(|role| self.bucket(*role).len()).sum()
    }

    /// Returns true if every bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the only clause when exactly one bucket holds exactly one clause.
    pub fn single_clause(&self) -> Option<(Role, &Query)> {
        if self.len() != 1 {
            return None;
        }
        Role::ALL
            .into_iter()
            .find_map(|role| self.bucket(role).first().map(|q| (role, q)))
    }
}
