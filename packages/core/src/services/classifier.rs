//! Index classification
//!
//! Decides, for one desired index, whether the catalog already satisfies it.
//! Two lookups feed the decision:
//!
//! 1. **by name**: the spec's explicit name is a catalog key
//! 2. **by sequence**: some catalog entry has exactly the spec's key sequence
//!
//! | by name | by sequence | outcome                                      |
//! |---------|-------------|----------------------------------------------|
//! | yes     | same entry  | `NoOp`                                       |
//! | yes     | no          | `Rebuild` (name kept, fields were edited)    |
//! | no      | yes         | `NoOp` (satisfied under another name)        |
//! | yes     | other entry | `NoOp` (two indexes overlap, configuration is redundant) |
//! | no      | no          | `Create`                                     |
//!
//! [`classify`] is a pure function of the spec and the catalog. Logging the
//! decision is left to the caller.

use super::Catalog;
use crate::models::IndexSpec;
use serde::Serialize;
use std::fmt;

/// Action required for one desired index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// Already satisfied
    NoOp,
    /// Name exists with different keys; needs drop-and-recreate
    Rebuild,
    /// Nothing matches
    Create,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Classification::NoOp => "NO_OP",
            Classification::Rebuild => "REBUILD",
            Classification::Create => "CREATE",
        })
    }
}

/// Non-fatal inconsistency between configuration and store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigurationWarning {
    /// The desired name exists but indexes different fields
    NameClaimedFieldsDiffer { name: String },
    /// The desired fields are indexed, but under another name
    SequenceUnderDifferentName { existing: String },
    /// One index holds the name, a different one holds the fields
    RedundantIndexes { by_name: String, by_sequence: String },
}

impl fmt::Display for ConfigurationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationWarning::NameClaimedFieldsDiffer { name } => write!(
                f,
                "index '{}' exists but for different fields; the existing index was edited",
                name
            ),
            ConfigurationWarning::SequenceUnderDifferentName { existing } => {
                write!(f, "fields are already indexed under name '{}'", existing)
            }
            ConfigurationWarning::RedundantIndexes {
                by_name,
                by_sequence,
            } => write!(
                f,
                "index '{}' matches the name and index '{}' matches the fields; configuration is redundant",
                by_name, by_sequence
            ),
        }
    }
}

/// Classification plus the evidence it was based on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub classification: Classification,

    /// Catalog entry found by explicit name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_name: Option<String>,

    /// Catalog entry found by key sequence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_sequence: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<ConfigurationWarning>,
}

/// Classify `spec` against `catalog`
///
/// When the entry found by name also has the desired keys it is taken as the
/// sequence match, even if an earlier entry has the same keys.
pub fn classify(spec: &IndexSpec, catalog: &Catalog) -> Decision {
    let by_name = spec.name().and_then(|name| catalog.get(name));
    let by_sequence = match by_name {
        Some(named) if named.keys.matches(&spec.keys) => Some(named),
        _ => catalog.find_by_sequence(&spec.keys),
    };

    let (classification, warning) = match (by_name, by_sequence) {
        (Some(named), Some(sequenced)) if named.name == sequenced.name => {
            (Classification::NoOp, None)
        }
        (Some(named), None) => (
            Classification::Rebuild,
            Some(ConfigurationWarning::NameClaimedFieldsDiffer {
                name: named.name.clone(),
            }),
        ),
        (None, Some(sequenced)) => (
            Classification::NoOp,
            Some(ConfigurationWarning::SequenceUnderDifferentName {
                existing: sequenced.name.clone(),
            }),
        ),
        (Some(named), Some(sequenced)) => (
            Classification::NoOp,
            Some(ConfigurationWarning::RedundantIndexes {
                by_name: named.name.clone(),
                by_sequence: sequenced.name.clone(),
            }),
        ),
        (None, None) => (Classification::Create, None),
    };

    Decision {
        classification,
        by_name: by_name.map(|index| index.name.clone()),
        by_sequence: by_sequence.map(|index| index.name.clone()),
        warning,
    }
}
