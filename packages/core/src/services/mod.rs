//! Reconciliation Services
//!
//! - [`Catalog`] / [`read_catalog`] - snapshot of a collection's indexes
//! - [`classify`] - pure NO_OP / REBUILD / CREATE decision for one spec
//! - [`CollectionReconciler`] - classifies and applies specs for one collection
//! - [`IndexManager`] - runs reconcilers over all configured collections
//! - [`RunReport`] - per-collection, per-spec outcomes of a run

pub mod catalog;
pub mod classifier;
pub mod error;
pub mod index_manager;
pub mod reconciler;
pub mod report;

pub use catalog::{read_catalog, Catalog};
pub use classifier::{classify, Classification, ConfigurationWarning, Decision};
pub use error::IndexServiceError;
pub use index_manager::{IndexManager, ManagerSettings, Mode};
pub use reconciler::{CollectionReconciler, CreateFailurePolicy, ReconcileOptions};
pub use report::{Action, CollectionReport, ReadFailure, RunReport, SpecOutcome};
