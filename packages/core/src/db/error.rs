//! Store Error Types
//!
//! This module defines error types for the store boundary: listing the
//! indexes of a collection and creating new ones.

use serde::Serialize;
use thiserror::Error;

/// Store operation errors
///
/// Covers driver failures and records the store returned in a shape the
/// catalog reader cannot use. Service-level context (which collection, which
/// desired index) is added by `IndexServiceError`.
#[derive(Error, Debug)]
pub enum StoreError {
    /// MongoDB driver error (network, auth, command failure)
    #[error("MongoDB operation failed: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// An index record is missing its name or key document
    #[error("Malformed index record on '{collection}': {reason}")]
    MalformedIndex { collection: String, reason: String },

    /// A spec could not be encoded into the store's index format
    #[error("Failed to encode index definition: {0}")]
    Encode(String),

    /// Collection cannot be read (missing, not permitted, ...)
    #[error("Collection '{collection}' unavailable: {reason}")]
    CollectionUnavailable { collection: String, reason: String },

    /// Store rejected an index that clashes with an existing one
    #[error("Index '{name}' conflicts with an existing index: {reason}")]
    IndexConflict { name: String, reason: String },
}

/// Coarse category of a [`StoreError`], kept in reports next to the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreErrorKind {
    Driver,
    MalformedIndex,
    Encode,
    CollectionUnavailable,
    IndexConflict,
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::Driver(_) => StoreErrorKind::Driver,
            Self::MalformedIndex { .. } => StoreErrorKind::MalformedIndex,
            Self::Encode(_) => StoreErrorKind::Encode,
            Self::CollectionUnavailable { .. } => StoreErrorKind::CollectionUnavailable,
            Self::IndexConflict { .. } => StoreErrorKind::IndexConflict,
        }
    }

    /// Create a malformed index error
    pub fn malformed_index(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIndex {
            collection: collection.into(),
            reason: reason.into(),
        }
    }

    /// Create an encode error
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a collection unavailable error
    pub fn collection_unavailable(
        collection: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::CollectionUnavailable {
            collection: collection.into(),
            reason: reason.into(),
        }
    }

    /// Create an index conflict error
    pub fn index_conflict(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IndexConflict {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
