//! In-process implementation of [`IndexStore`]
//!
//! Holds index definitions per collection in memory and records every create
//! request it receives. It follows the store's conflict rules closely enough
//! for reconciliation tests and offline planning:
//!
//! - creating an index whose name exists with the same keys is a no-op
//! - a name reused for different keys, or keys reused under a different
//!   name, is rejected with [`StoreError::IndexConflict`]
//! - listing an unknown collection fails like a missing namespace
//!
//! Failures can be injected per collection (listing) or per index name
//! (creation).

use super::{IndexStore, StoreError};
use crate::models::{ExistingIndex, IndexSpec};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A create request as received by the store
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    pub collection: String,
    pub spec: IndexSpec,
}

#[derive(Default)]
struct StoreState {
    collections: HashMap<String, Vec<ExistingIndex>>,
    create_requests: Vec<CreateRequest>,
    list_requests: Vec<String>,
    failing_lists: HashSet<String>,
    failing_creates: HashSet<String>,
}

/// Index store kept entirely in memory
pub struct InMemoryIndexStore {
    database_name: String,
    state: Mutex<StoreState>,
}

impl InMemoryIndexStore {
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            state: Mutex::new(StoreState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an empty collection
    pub fn with_collection(self, collection: impl Into<String>) -> Self {
        self.state().collections.entry(collection.into()).or_default();
        self
    }

    /// Register an existing index (creating the collection if needed)
    pub fn with_index(self, collection: impl Into<String>, index: ExistingIndex) -> Self {
        self.state()
            .collections
            .entry(collection.into())
            .or_default()
            .push(index);
        self
    }

    /// Make every `list_indexes` call for `collection` fail
    pub fn fail_list_for(self, collection: impl Into<String>) -> Self {
        self.state().failing_lists.insert(collection.into());
        self
    }

    /// Make every create of an index with this (display) name fail
    pub fn fail_create_for(self, index_name: impl Into<String>) -> Self {
        self.state().failing_creates.insert(index_name.into());
        self
    }

    /// Every create request received so far, in order
    pub fn create_requests(&self) -> Vec<CreateRequest> {
        self.state().create_requests.clone()
    }

    /// Collections listed so far, in order
    pub fn list_requests(&self) -> Vec<String> {
        self.state().list_requests.clone()
    }

    /// Current indexes of `collection` (empty if unknown)
    pub fn indexes(&self, collection: &str) -> Vec<ExistingIndex> {
        self.state()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl IndexStore for InMemoryIndexStore {
    fn database_name(&self) -> &str {
        &self.database_name
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<ExistingIndex>, StoreError> {
        let mut state = self.state();
        state.list_requests.push(collection.to_string());

        if state.failing_lists.contains(collection) {
            return Err(StoreError::collection_unavailable(
                collection,
                "listIndexes rejected by store",
            ));
        }

        let indexes = state.collections.get(collection).cloned();
        indexes.ok_or_else(|| StoreError::collection_unavailable(collection, "collection does not exist"))
    }

    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> Result<String, StoreError> {
        let mut state = self.state();
        state.create_requests.push(CreateRequest {
            collection: collection.to_string(),
            spec: spec.clone(),
        });

        let name = spec.display_name();
        if state.failing_creates.contains(&name) {
            return Err(StoreError::index_conflict(name, "createIndexes rejected by store"));
        }

        let indexes = state.collections.entry(collection.to_string()).or_default();
        if let Some(existing) = indexes.iter().find(|index| index.name == name) {
            if existing.keys.matches(&spec.keys) {
                return Ok(name);
            }
            return Err(StoreError::index_conflict(
                name,
                format!("name already used for keys {}", existing.keys),
            ));
        }
        if let Some(existing) = indexes.iter().find(|index| index.keys.matches(&spec.keys)) {
            return Err(StoreError::index_conflict(
                name,
                format!("keys {} already indexed as '{}'", spec.keys, existing.name),
            ));
        }

        indexes.push(ExistingIndex::new(name.clone(), spec.keys.clone()));
        Ok(name)
    }
}
