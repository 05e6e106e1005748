//! Error types for esq configuration.

use std::{io, path::PathBuf};

use thiserror::Error;
use toml::de;

/// Errors that can occur when loading or processing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse config file {path}: {source}")]
    ParseToml {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: de::Error,
    },

    /// A relation declares an empty nested path.
    #[error("relation '{relation}' in {file} has an empty nested path")]
    EmptyNestedPath {
        /// Name of the relation.
        relation: String,
        /// File that defined the relation.
        file: PathBuf,
    },

    /// A relation prefix cannot appear as a field prefix in a query.
    #[error("relation '{relation}' has invalid prefix '{prefix}': {reason}")]
    InvalidPrefix {
        /// Name of the relation.
        relation: String,
        /// The rejected prefix.
        prefix: String,
        /// Why the prefix was rejected.
        reason: &'static str,
    },

    /// Two relations claim the same field prefix.
    #[error("prefix '{prefix}' is claimed by both relation '{first}' and relation '{second}'")]
    DuplicatePrefix {
        /// The contested prefix.
        prefix: String,
        /// Relation that claimed it first (higher precedence).
        first: String,
        /// Relation that claimed it again.
        second: String,
    },

    /// A configured depth limit exceeds what the compiler supports.
    #[error("max_depth = {value} in {file} exceeds the limit of {limit}")]
    MaxDepthOutOfRange {
        /// The configured value.
        value: usize,
        /// Largest accepted value.
        limit: usize,
        /// File that set it.
        file: PathBuf,
    },

    /// Failed to determine home directory.
    #[error("could not determine home directory")]
    NoHomeDirectory,
}
