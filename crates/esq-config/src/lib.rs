//! Configuration system for esq.
//!
//! esq uses TOML configuration files named `.esq.toml`. Configuration is resolved by walking
//! up the directory tree from the current working directory, collecting any `.esq.toml` files
//! found, then loading `~/.esq.toml` as the global config with lowest precedence.
//!
//! The configuration owns the nested relation registry: each `[relation.NAME]` table maps one
//! or more field prefixes to a nested path, which the query compiler uses to group terms into
//! `nested` clauses.

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;
mod templates;
#[cfg(test)]
mod test_support;
mod validate;

use std::path::{Path, PathBuf};

pub use discovery::{
    CONFIG_FILENAME, discover_config_files, global_config_path, is_global_config,
    require_global_config_path,
};
pub use error::ConfigError;
use esq_query::{Compiler, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT, RelationMap};
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{RawConfig, RawRelation, RawSettings, parse_config_file, parse_config_str};
use serde::{Deserialize, Serialize};
pub use templates::{global_template, local_template};
pub use validate::ConfigWarning;
use validate::validate_config;

/// Top-level merged configuration for esq.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// General settings.
    pub settings: Settings,
    /// Nested relations, sorted by name.
    pub relations: Vec<Relation>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant `.esq.toml` files.
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        if files.is_empty() {
            return Ok(Self::default());
        }

        let parsed: Vec<ParsedConfig> = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        merge_configs(&parsed)
    }

    /// Builds the prefix -> nested path registry consumed by the compiler.
    pub fn relation_map(&self) -> RelationMap {
        self.relations
            .iter()
            .flat_map(|relation| {
                relation
                    .prefixes
                    .iter()
                    .map(|prefix| (prefix.clone(), relation.path.clone()))
            })
            .collect()
    }

    /// Builds a compiler over this configuration's relations and depth limit.
    pub fn compiler(&self) -> Compiler<RelationMap> {
        Compiler::new(self.relation_map()).with_max_depth(self.settings.max_depth)
    }

    /// Validates the configuration and returns any warnings.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective settings to TOML format.
    pub fn settings_to_toml(&self) -> String {
        let serializable = SerializableSettings {
            settings: self.settings.clone(),
        };
        toml::to_string_pretty(&serializable).expect("settings serialization should not fail")
    }
}

/// General settings for esq.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Deepest group nesting accepted in a query, at most [`MAX_DEPTH_LIMIT`].
    pub max_depth: usize,
    /// Whether compiled documents are pretty-printed.
    pub pretty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            pretty: true,
        }
    }
}

/// Internal struct for TOML serialization of settings.
#[derive(Serialize)]
struct SerializableSettings {
    /// General settings.
    settings: Settings,
}

/// A nested relation: field prefixes whose terms live in one-to-many sub-documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Name of the relation (the `[relation.NAME]` key).
    pub name: String,
    /// Nested path used in compiled queries.
    pub path: String,
    /// Field prefixes routed to this relation.
    pub prefixes: Vec<String>,
    /// Whether this relation was defined in the global `~/.esq.toml`.
    pub is_global: bool,
    /// File that defined the relation.
    pub source: PathBuf,
}
