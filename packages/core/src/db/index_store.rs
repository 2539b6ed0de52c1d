//! IndexStore Trait - Store Abstraction Layer
//!
//! The reconciler needs exactly two things from a document store: the list of
//! indexes on a collection and a way to create one. `IndexStore` captures that
//! seam so the reconciliation logic runs unchanged against MongoDB
//! ([`MongoIndexStore`](super::MongoIndexStore)) or an in-process store
//! ([`InMemoryIndexStore`](super::InMemoryIndexStore)).
//!
//! # Examples
//!
//! ```rust,no_run
//! use indexsync_core::db::{IndexStore, InMemoryIndexStore};
//! use indexsync_core::models::{IndexSpec, KeySequence};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), indexsync_core::db::StoreError> {
//!     let store: Arc<dyn IndexStore> = Arc::new(InMemoryIndexStore::new("shop"));
//!
//!     let keys: KeySequence = [("item", 1), ("category", 1)].into_iter().collect();
//!     let spec = IndexSpec::new(keys).with_name("item_1_category_1");
//!     store.create_index("products", &spec).await?;
//!
//!     let existing = store.list_indexes("products").await?;
//!     assert_eq!(existing.len(), 1);
//!     Ok(())
//! }
//! ```

use super::StoreError;
use crate::models::{ExistingIndex, IndexSpec};
use async_trait::async_trait;

/// Abstraction over the document store holding the collections
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a store can be shared behind an
/// `Arc` and used from async tasks.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Name of the database the store operates on (used for log context)
    fn database_name(&self) -> &str;

    /// List every index currently defined on `collection`, in store order
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be reached, the caller is not
    /// authorised, the collection does not exist, or a record lacks a name
    /// or key document.
    async fn list_indexes(&self, collection: &str) -> Result<Vec<ExistingIndex>, StoreError>;

    /// Create the index described by `spec` on `collection`
    ///
    /// # Returns
    ///
    /// The name of the created index (explicit or store-generated)
    ///
    /// # Errors
    ///
    /// Returns error if the store rejects the definition, e.g. an index with
    /// the same name but different keys or options already exists.
    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> Result<String, StoreError>;
}
