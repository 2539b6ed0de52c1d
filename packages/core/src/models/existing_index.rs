//! Index records read back from the store

use super::KeySequence;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An index currently defined on a collection
///
/// `metadata` keeps every other field of the store's record (`v`, `unique`,
/// `collation`, ...) as-is. The reconciler never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingIndex {
    pub name: String,
    pub keys: KeySequence,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ExistingIndex {
    pub fn new(name: impl Into<String>, keys: KeySequence) -> Self {
        Self {
            name: name.into(),
            keys,
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
