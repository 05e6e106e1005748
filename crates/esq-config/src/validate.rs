//! Configuration validation.
//!
//! Validates a loaded configuration and reports warnings for potential issues.

use std::fmt;

use crate::Config;

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// No relations are defined, so no term will ever be nested.
    NoRelationsDefined,
    /// A relation's nested path is identical to one of its prefixes.
    PathEqualsPrefix {
        /// Name of the relation.
        relation: String,
        /// The prefix equal to the path.
        prefix: String,
    },
    /// A prefix is never used for fields under a longer prefix of another relation.
    ShadowedPrefix {
        /// Relation owning the shorter prefix.
        relation: String,
        /// The shorter prefix.
        prefix: String,
        /// Relation owning the longer prefix.
        by_relation: String,
        /// The longer prefix that takes precedence.
        by_prefix: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRelationsDefined => {
                write!(f, "no relations are defined in configuration")
            }
            Self::PathEqualsPrefix { relation, prefix } => {
                write!(
                    f,
                    "relation '{relation}' uses '{prefix}' as both prefix and nested path; \
                     rewritten fields will read '{prefix}.<field>' unchanged"
                )
            }
            Self::ShadowedPrefix {
                relation,
                prefix,
                by_relation,
                by_prefix,
            } => {
                write!(
                    f,
                    "fields under '{by_prefix}.' resolve to relation '{by_relation}', \
                     not '{relation}' (prefix '{prefix}')"
                )
            }
        }
    }
}

/// Validates the configuration and returns any warnings.
///
/// This checks for:
/// - Empty configuration (no relations defined)
/// - Relations whose nested path equals a prefix
/// - Prefixes partly hidden by a longer prefix of a different relation
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if config.relations.is_empty() {
        warnings.push(ConfigWarning::NoRelationsDefined);
        return warnings;
    }

    for relation in &config.relations {
        for prefix in &relation.prefixes {
            if *prefix == relation.path {
                warnings.push(ConfigWarning::PathEqualsPrefix {
                    relation: relation.name.clone(),
                    prefix: prefix.clone(),
                });
            }
        }
    }

    for relation in &config.relations {
        for prefix in &relation.prefixes {
            for other in config.relations.iter().filter(|r| r.name != relation.name) {
                for longer in &other.prefixes {
                    if is_dotted_extension(longer, prefix) {
                        warnings.push(ConfigWarning::ShadowedPrefix {
                            relation: relation.name.clone(),
                            prefix: prefix.clone(),
                            by_relation: other.name.clone(),
                            by_prefix: longer.clone(),
                        });
                    }
                }
            }
        }
    }

    warnings
}

/// Whether `longer` is `prefix` followed by one or more dotted segments.
fn is_dotted_extension(longer: &str, prefix: &str) -> bool {
    longer
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('.'))
}
