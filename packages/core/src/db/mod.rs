//! Store Layer
//!
//! This module is the boundary to the document store that owns the indexes:
//!
//! - [`IndexStore`] - the two operations reconciliation needs (list, create)
//! - [`MongoIndexStore`] - MongoDB driver implementation
//! - [`InMemoryIndexStore`] - in-process store for tests and offline planning
//!
//! Nothing here classifies or decides; it only reads and writes index
//! definitions and reports store failures as [`StoreError`].

mod error;
mod index_store;
mod memory_store;
mod mongo_store;

pub use error::{StoreError, StoreErrorKind};
pub use index_store::IndexStore;
pub use memory_store::{CreateRequest, InMemoryIndexStore};
pub use mongo_store::MongoIndexStore;
