//! Nested-path resolution.
//!
//! Fields whose dotted prefix names a nested relation must be queried inside a
//! `nested` clause, under the relation's nested path. The mapping is owned by
//! configuration and handed to the compiler as a [`NestedResolver`].

use std::collections::BTreeMap;

use crate::error::ResolveError;

/// A field rewritten into a nested relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedField {
    /// Nested path name (e.g. `assignments_nested`).
    pub path: String,
    /// Fully qualified field inside the nested path (e.g. `assignments_nested.assignee_id`).
    pub field: String,
}

/// Looks up the nested relation of a field.
///
/// Implementations are read-only while queries compile and may be shared
/// between threads.
pub trait NestedResolver {
    /// Returns the nested relation for `field`, or `None` for top-level fields.
    fn resolve(&self, field: &str) -> Result<Option<NestedField>, ResolveError>;
}

impl<R: NestedResolver + ?Sized> NestedResolver for &R {
    fn resolve(&self, field: &str) -> Result<Option<NestedField>, ResolveError> {
        (**self).resolve(field)
    }
}

/// Resolver that treats every field as top-level.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRelations;

impl NestedResolver for NoRelations {
    fn resolve(&self, _field: &str) -> Result<Option<NestedField>, ResolveError> {
        Ok(None)
    }
}

/// Map from dotted field prefix to nested path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationMap {
    /// Prefix -> nested path.
    prefixes: BTreeMap<String, String>,
}

impl RelationMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `prefix` as belonging to the nested path `path`.
    ///
    /// Returns the path previously registered for this prefix, if any.
    pub fn insert(&mut self, prefix: impl Into<String>, path: impl Into<String>) -> Option<String> {
        self.prefixes.insert(prefix.into(), path.into())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, prefix: impl Into<String>, path: impl Into<String>) -> Self {
        self.insert(prefix, path);
        self
    }

    /// Returns the nested path registered for an exact prefix.
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// Iterates registered `(prefix, path)` pairs in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of registered prefixes.
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// Returns true if no prefix is registered.
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Finds the longest registered prefix of `field` ending at a dot.
    fn lookup(&self, field: &str) -> Option<NestedField> {
        let mut end = field.len();
        while let Some(dot) = field[..end].rfind('.') {
            let prefix = &field[..dot];
            if let Some(path) = self.prefixes.get(prefix) {
                return Some(NestedField {
                    path: path.clone(),
                    field: format!("{path}{}", &field[dot..]),
                });
            }
            end = dot;
        }
        None
    }
}

impl NestedResolver for RelationMap {
    fn resolve(&self, field: &str) -> Result<Option<NestedField>, ResolveError> {
        Ok(self.lookup(field))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RelationMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (prefix, path) in iter {
            map.insert(prefix, path);
        }
        map
    }
}
