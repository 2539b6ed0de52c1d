//! Index Catalog
//!
//! A [`Catalog`] is the snapshot of one collection's indexes taken at the
//! start of a reconciliation. It answers two questions: "is there an index
//! with this name?" and "which index, if any, has exactly these keys?".
//!
//! Entries keep the order the store listed them in. Sequence lookups return
//! the first match in that order, so classification never depends on hash
//! iteration order.

use super::IndexServiceError;
use crate::db::IndexStore;
use crate::models::{ExistingIndex, KeySequence};
use std::collections::HashMap;

/// Snapshot of the indexes defined on one collection
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    collection: String,
    entries: Vec<ExistingIndex>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    /// Create an empty catalog for `collection`
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            entries: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Build a catalog from listed indexes
    pub fn from_indexes(
        collection: impl Into<String>,
        indexes: impl IntoIterator<Item = ExistingIndex>,
    ) -> Self {
        let mut catalog = Self::new(collection);
        for index in indexes {
            catalog.insert(index);
        }
        catalog
    }

    /// Add an index; a later record with the same name replaces the earlier one
    pub fn insert(&mut self, index: ExistingIndex) {
        match self.by_name.get(&index.name).copied() {
            Some(position) => self.entries[position] = index,
            None => {
                self.by_name.insert(index.name.clone(), self.entries.len());
                self.entries.push(index);
            }
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Look up an index by name
    pub fn get(&self, name: &str) -> Option<&ExistingIndex> {
        self.by_name.get(name).map(|&position| &self.entries[position])
    }

    /// First index (in listing order) whose key sequence matches `keys`
    pub fn find_by_sequence(&self, keys: &KeySequence) -> Option<&ExistingIndex> {
        self.entries.iter().find(|index| index.keys.matches(keys))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExistingIndex> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|index| index.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read the current indexes of `collection` into a [`Catalog`]
///
/// # Errors
///
/// Any store failure is returned unchanged inside
/// [`IndexServiceError::StoreRead`]. There is no retry.
pub async fn read_catalog(
    store: &dyn IndexStore,
    collection: &str,
) -> Result<Catalog, IndexServiceError> {
    let indexes = store
        .list_indexes(collection)
        .await
        .map_err(|source| IndexServiceError::store_read(collection, source))?;

    Ok(Catalog::from_indexes(collection, indexes))
}
