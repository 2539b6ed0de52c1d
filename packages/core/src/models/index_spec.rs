//! Desired index declarations
//!
//! An [`IndexSpec`] is what the caller wants to exist on a collection: an
//! ordered key sequence plus creation options. Specs are supplied by
//! configuration or code and are never mutated by the reconciler.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Direction (or special type) of one indexed field
///
/// Stores report directions with whatever numeric width they were created
/// with, so `1`, `1i64` and `1.0` all mean ascending. Text values cover
/// special index types such as `"text"`, `"2dsphere"` or `"hashed"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyDirection {
    Int(i64),
    Double(f64),
    Text(String),
}

impl KeyDirection {
    /// Typed equality across numeric representations
    ///
    /// Numbers compare by value (`Int(1)` matches `Double(1.0)`), text compares
    /// by string, and a number never matches text.
    pub fn matches(&self, other: &KeyDirection) -> bool {
        match (self, other) {
            (KeyDirection::Int(a), KeyDirection::Int(b)) => a == b,
            (KeyDirection::Double(a), KeyDirection::Double(b)) => a == b,
            (KeyDirection::Int(i), KeyDirection::Double(d))
            | (KeyDirection::Double(d), KeyDirection::Int(i)) => {
                d.fract() == 0.0 && (*i as f64) == *d
            }
            (KeyDirection::Text(a), KeyDirection::Text(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, KeyDirection::Text(_))
    }
}

impl PartialEq for KeyDirection {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl fmt::Display for KeyDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyDirection::Int(v) => write!(f, "{}", v),
            KeyDirection::Double(v) if v.fract() == 0.0 => write!(f, "{:.0}", v),
            KeyDirection::Double(v) => write!(f, "{}", v),
            KeyDirection::Text(v) => f.write_str(v),
        }
    }
}

impl From<i32> for KeyDirection {
    fn from(value: i32) -> Self {
        KeyDirection::Int(value as i64)
    }
}

impl From<i64> for KeyDirection {
    fn from(value: i64) -> Self {
        KeyDirection::Int(value)
    }
}

impl From<f64> for KeyDirection {
    fn from(value: f64) -> Self {
        KeyDirection::Double(value)
    }
}

impl From<&str> for KeyDirection {
    fn from(value: &str) -> Self {
        KeyDirection::Text(value.to_string())
    }
}

/// One `(field, direction)` pair of a key sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexKey {
    pub field: String,
    pub direction: KeyDirection,
}

impl IndexKey {
    pub fn new(field: impl Into<String>, direction: impl Into<KeyDirection>) -> Self {
        Self {
            field: field.into(),
            direction: direction.into(),
        }
    }
}

/// Ordered list of index keys
///
/// Order is significant: `{a: 1, b: 1}` and `{b: 1, a: 1}` are different
/// indexes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySequence(Vec<IndexKey>);

impl KeySequence {
    pub fn new(keys: Vec<IndexKey>) -> Self {
        Self(keys)
    }

    /// Element-wise comparison: same length, same field at every position,
    /// and directions equal under [`KeyDirection::matches`]
    pub fn matches(&self, other: &KeySequence) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(a, b)| a.field == b.field && a.direction.matches(&b.direction))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexKey> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Name the store generates when none is given, e.g. `item_1_category_1`
    pub fn generated_name(&self) -> String {
        self.0
            .iter()
            .map(|key| format!("{}_{}", key.field, key.direction))
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl<F, D> FromIterator<(F, D)> for KeySequence
where
    F: Into<String>,
    D: Into<KeyDirection>,
{
    fn from_iter<I: IntoIterator<Item = (F, D)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, direction)| IndexKey::new(field, direction))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a KeySequence {
    type Item = &'a IndexKey;
    type IntoIter = std::slice::Iter<'a, IndexKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", key.field, key.direction)?;
        }
        f.write_str("}")
    }
}

/// Locale-aware string comparison rules for an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collation {
    pub locale: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_level: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_ordering: Option<bool>,
}

/// Options applied when an index is created
///
/// All fields are optional. Only `name` takes part in classification; the
/// rest are passed through to the store on create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sparse: Option<bool>,

    /// Filter document restricting which documents are indexed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_filter_expression: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collation: Option<Collation>,

    /// TTL in seconds for single-field date indexes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_after_seconds: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

/// A desired index: key sequence plus creation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub keys: KeySequence,

    #[serde(default)]
    pub options: IndexOptions,
}

impl IndexSpec {
    pub fn new(keys: KeySequence) -> Self {
        Self {
            keys,
            options: IndexOptions::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.options.name = Some(name.into());
        self
    }

    pub fn with_options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self
    }

    /// Explicitly declared name, if any
    pub fn name(&self) -> Option<&str> {
        self.options.name.as_deref()
    }

    /// Explicit name, or the name the store will generate
    pub fn display_name(&self) -> String {
        match &self.options.name {
            Some(name) => name.clone(),
            None => self.keys.generated_name(),
        }
    }
}

/// Desired indexes for one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionIndexes {
    pub name: String,

    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
}

impl CollectionIndexes {
    pub fn new(name: impl Into<String>, indexes: Vec<IndexSpec>) -> Self {
        Self {
            name: name.into(),
            indexes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_directions_match_across_representations() {
        assert!(KeyDirection::Int(1).matches(&KeyDirection::Double(1.0)));
        assert!(KeyDirection::Double(-1.0).matches(&KeyDirection::Int(-1)));
        assert!(!KeyDirection::Int(1).matches(&KeyDirection::Double(1.5)));
        assert!(!KeyDirection::Int(1).matches(&KeyDirection::Int(-1)));
    }

    #[test]
    fn test_number_never_matches_text() {
        assert!(!KeyDirection::Int(1).matches(&KeyDirection::Text("1".into())));
        assert!(!KeyDirection::Text("text".into()).matches(&KeyDirection::Double(1.0)));
        assert!(KeyDirection::Text("2dsphere".into()).matches(&KeyDirection::Text("2dsphere".into())));
    }

    #[test]
    fn test_sequence_match_is_order_sensitive() {
        let desired: KeySequence = [("a", 1), ("b", 1)].into_iter().collect();
        let swapped: KeySequence = [("b", 1), ("a", 1)].into_iter().collect();
        let same: KeySequence = [("a", 1.0), ("b", 1.0)].into_iter().collect();

        assert!(!desired.matches(&swapped));
        assert!(desired.matches(&same));
    }

    #[test]
    fn test_sequence_match_requires_same_length() {
        let desired: KeySequence = [("a", 1), ("b", 1)].into_iter().collect();
        let prefix: KeySequence = [("a", 1)].into_iter().collect();

        assert!(!desired.matches(&prefix));
        assert!(!prefix.matches(&desired));
    }

    #[test]
    fn test_display_name_falls_back_to_generated() {
        let keys: KeySequence = [("item", 1), ("category", -1)].into_iter().collect();
        let spec = IndexSpec::new(keys.clone());
        assert_eq!(spec.display_name(), "item_1_category_-1");

        let named = IndexSpec::new(keys).with_name("by_item");
        assert_eq!(named.display_name(), "by_item");
        assert_eq!(named.name(), Some("by_item"));
    }

    #[test]
    fn test_whole_double_directions_print_without_truncation() {
        assert_eq!(KeyDirection::Double(-1.0).to_string(), "-1");
        assert_eq!(KeyDirection::Double(1.5).to_string(), "1.5");
        assert_eq!(KeyDirection::Double(1e20).to_string(), "100000000000000000000");

        let keys: KeySequence = [("a", 1e20)].into_iter().collect();
        assert_eq!(keys.generated_name(), "a_100000000000000000000");
    }

    #[test]
    fn test_deserialize_spec_from_json() {
        let spec: IndexSpec = serde_json::from_value(json!({
            "keys": [
                {"field": "item", "direction": 1},
                {"field": "price", "direction": -1.0},
                {"field": "body", "direction": "text"}
            ],
            "options": {"name": "item_price_body", "unique": true}
        }))
        .unwrap();

        let directions: Vec<_> = spec.keys.iter().map(|k| k.direction.clone()).collect();
        assert!(matches!(directions[0], KeyDirection::Int(1)));
        assert!(matches!(directions[1], KeyDirection::Double(d) if d == -1.0));
        assert!(matches!(directions[2], KeyDirection::Text(ref t) if t == "text"));
        assert_eq!(spec.options.unique, Some(true));
        assert_eq!(spec.options.sparse, None);
    }
}
