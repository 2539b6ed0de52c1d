//! Data Models
//!
//! This module contains the data structures shared by the store layer and the
//! reconciliation services:
//!
//! - `IndexSpec` - a desired index (key sequence + options)
//! - `ExistingIndex` - an index as reported by the store
//! - `KeyDirection` / `KeySequence` - typed key definitions with the
//!   comparison rules used for sequence matching

mod existing_index;
mod index_spec;

pub use existing_index::ExistingIndex;
pub use index_spec::{
    Collation, CollectionIndexes, IndexKey, IndexOptions, IndexSpec, KeyDirection, KeySequence,
};
