//! IndexSync Core
//!
//! Reconciles declared MongoDB indexes against the indexes that actually
//! exist on each collection: missing ones are created, ones that are already
//! satisfied are left alone, and ambiguous states are reported.
//!
//! # Architecture
//!
//! - **Snapshot per collection**: existing indexes are read once, then every
//!   desired index is classified against that snapshot
//! - **Pure classification**: NO_OP / REBUILD / CREATE depends only on the
//!   desired spec and the snapshot
//! - **Per-spec outcomes**: create failures are reported per index, never
//!   swallowed
//!
//! # Modules
//!
//! - [`models`] - Index specs, key sequences and existing index records
//! - [`db`] - Store boundary (MongoDB and in-memory implementations)
//! - [`services`] - Catalog reader, classifier, reconciler, orchestrator
//! - [`config`] - JSON configuration for a run

pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::{ConnectionConfig, IndexSyncConfig};
pub use db::{InMemoryIndexStore, IndexStore, MongoIndexStore, StoreError, StoreErrorKind};
pub use models::*;
pub use services::*;
