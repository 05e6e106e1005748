//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`,
//! applying precedence rules and validating relation prefixes.

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

use esq_query::MAX_DEPTH_LIMIT;
use tracing::debug;

use crate::{
    Config, ConfigError, Relation, Settings,
    discovery::is_global_config,
    parse::{RawConfig, RawRelation, RawSettings},
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs should be provided in precedence order: highest precedence first (closest to CWD),
/// lowest precedence last (global config).
///
/// Merge rules:
/// - Scalar settings: first defined value wins (highest precedence)
/// - Relations: merged by name, first definition wins completely (path and prefixes)
/// - A prefix may belong to only one relation
pub fn merge_configs(configs: &[ParsedConfig]) -> Result<Config, ConfigError> {
    if configs.is_empty() {
        return Ok(Config::default());
    }

    let settings = merge_settings(configs)?;
    let relations = merge_relations(configs)?;

    debug!(
        files = configs.len(),
        relations = relations.len(),
        "merged configuration"
    );

    Ok(Config {
        settings,
        relations,
    })
}

/// Merges general settings, taking first defined value for each field.
///
/// Every file's `max_depth` must be within [`MAX_DEPTH_LIMIT`], even when a
/// closer file overrides it.
fn merge_settings(configs: &[ParsedConfig]) -> Result<Settings, ConfigError> {
    let mut result = Settings::default();

    // Lowest precedence first so higher precedence overwrites
    for parsed in configs.iter().rev() {
        if let Some(ref settings) = parsed.config.settings {
            if let Some(value) = settings.max_depth.filter(|v| *v > MAX_DEPTH_LIMIT) {
                return Err(ConfigError::MaxDepthOutOfRange {
                    value,
                    limit: MAX_DEPTH_LIMIT,
                    file: parsed.path.clone(),
                });
            }
            apply_raw_settings(&mut result, settings);
        }
    }

    Ok(result)
}

/// Applies raw settings to result, overwriting any present values.
fn apply_raw_settings(result: &mut Settings, raw: &RawSettings) {
    if let Some(v) = raw.max_depth {
        result.max_depth = v;
    }
    if let Some(v) = raw.pretty {
        result.pretty = v;
    }
}

/// Merges relations from all configs.
///
/// Relations are merged by name - first definition wins completely.
/// `is_global` is determined by whether the source config file is `~/.esq.toml`.
fn merge_relations(configs: &[ParsedConfig]) -> Result<Vec<Relation>, ConfigError> {
    let mut seen: HashMap<String, Relation> = HashMap::new();
    let mut owners: HashMap<String, String> = HashMap::new();

    for parsed in configs {
        let Some(ref relations) = parsed.config.relation else {
            continue;
        };
        let is_global = is_global_config(&parsed.path);

        // Sorted so prefix conflicts within one file report deterministically
        let sorted: BTreeMap<&String, &RawRelation> = relations.iter().collect();
        for (name, raw) in sorted {
            if seen.contains_key(name) {
                // Already defined by higher-precedence config
                continue;
            }

            let relation = convert_relation(name, raw, &parsed.path, is_global)?;
            for prefix in &relation.prefixes {
                if let Some(first) = owners.get(prefix) {
                    return Err(ConfigError::DuplicatePrefix {
                        prefix: prefix.clone(),
                        first: first.clone(),
                        second: name.clone(),
                    });
                }
            }
            for prefix in &relation.prefixes {
                owners.insert(prefix.clone(), name.clone());
            }
            seen.insert(name.clone(), relation);
        }
    }

    let mut relations: Vec<Relation> = seen.into_values().collect();
    relations.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(relations)
}

/// Converts a raw relation to the final type, defaulting the prefix to the relation name.
fn convert_relation(
    name: &str,
    raw: &RawRelation,
    source: &Path,
    is_global: bool,
) -> Result<Relation, ConfigError> {
    let path = raw.path.trim();
    if path.is_empty() {
        return Err(ConfigError::EmptyNestedPath {
            relation: name.to_string(),
            file: source.to_path_buf(),
        });
    }

    let mut prefixes: Vec<String> = Vec::new();
    for prefix in raw
        .prefix
        .clone()
        .unwrap_or_else(|| vec![name.to_string()])
    {
        check_prefix(name, &prefix)?;
        if !prefixes.contains(&prefix) {
            prefixes.push(prefix);
        }
    }

    Ok(Relation {
        name: name.to_string(),
        path: path.to_string(),
        prefixes,
        is_global,
        source: source.to_path_buf(),
    })
}

/// Rejects prefixes that could never match the field part of a query term.
fn check_prefix(relation: &str, prefix: &str) -> Result<(), ConfigError> {
    let reason = if prefix.is_empty() {
        Some("prefix is empty")
    } else if prefix.chars().any(char::is_whitespace) {
        Some("prefix contains whitespace")
    } else if prefix.contains([':', '"', '(', ')']) {
        Some("prefix contains a reserved character")
    } else if prefix.starts_with('.') || prefix.ends_with('.') {
        Some("prefix starts or ends with '.'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigError::InvalidPrefix {
            relation: relation.to_string(),
            prefix: prefix.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
