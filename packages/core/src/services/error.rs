//! Service Layer Error Types
//!
//! This module defines error types for reconciliation runs, wrapping store
//! failures with the collection and index they happened on.

use crate::db::StoreError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reconciliation errors
///
/// `StoreRead` stops a run; `StoreWrite` is recorded against the single
/// desired index it belongs to and does not stop later ones.
#[derive(Error, Debug)]
pub enum IndexServiceError {
    /// Listing the existing indexes of a collection failed
    #[error("Failed to read indexes of collection '{collection}': {source}")]
    StoreRead {
        collection: String,
        source: StoreError,
    },

    /// Creating a desired index failed
    #[error("Failed to create index '{index}' on collection '{collection}': {source}")]
    StoreWrite {
        collection: String,
        index: String,
        source: StoreError,
    },

    /// Configuration is structurally valid JSON but semantically wrong
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON for the expected shape
    #[error("Failed to parse configuration file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The run did not finish within the configured time
    #[error("Index reconciliation timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl IndexServiceError {
    /// Create a store read error
    pub fn store_read(collection: impl Into<String>, source: StoreError) -> Self {
        Self::StoreRead {
            collection: collection.into(),
            source,
        }
    }

    /// Create a store write error
    pub fn store_write(
        collection: impl Into<String>,
        index: impl Into<String>,
        source: StoreError,
    ) -> Self {
        Self::StoreWrite {
            collection: collection.into(),
            index: index.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a configuration I/O error
    pub fn config_io(path: &Path, source: std::io::Error) -> Self {
        Self::ConfigIo {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a configuration parse error
    pub fn config_parse(path: &Path, source: serde_json::Error) -> Self {
        Self::ConfigParse {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a timeout error
    pub fn timeout(secs: u64) -> Self {
        Self::Timeout { secs }
    }
}
