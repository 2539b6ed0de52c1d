//! Index Manager
//!
//! Runs reconciliation over every configured collection, one collection at a
//! time. Each run gets its own root span (`indexsync_run`) carrying the run
//! id, database and mode; collection reconcilers log under it.
//!
//! ## Failure handling
//!
//! - a catalog read failure stops the run; it is recorded in
//!   [`RunReport::read_failure`] next to the collections already reconciled
//! - a create failure is recorded on its spec; the run continues unless the
//!   [`CreateFailurePolicy::Abort`] policy is set
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use indexsync_core::db::{IndexStore, InMemoryIndexStore};
//! use indexsync_core::models::{CollectionIndexes, IndexSpec, KeySequence};
//! use indexsync_core::services::{IndexManager, ManagerSettings};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), indexsync_core::services::IndexServiceError> {
//! let store: Arc<dyn IndexStore> = Arc::new(InMemoryIndexStore::new("mim").with_collection("products"));
//! let keys: KeySequence = [("item", 1), ("category", 1)].into_iter().collect();
//! let collections = vec![CollectionIndexes::new(
//!     "products",
//!     vec![IndexSpec::new(keys).with_name("item_1_category_1")],
//! )];
//!
//! let manager = IndexManager::new(store, ManagerSettings::default(), collections);
//! let report = manager.ensure().await?;
//! assert_eq!(report.created_count(), 1);
//! # Ok(())
//! # }
//! ```

use super::{
    read_catalog, Catalog, CollectionReconciler, CreateFailurePolicy, IndexServiceError,
    ReadFailure, ReconcileOptions, RunReport,
};
use crate::db::IndexStore;
use crate::models::CollectionIndexes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{Instrument, Span};
use uuid::Uuid;

/// Operating mode of a run
///
/// `Manual` is accepted for compatibility with existing configurations and
/// currently reconciles exactly like `Auto`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Auto,
    Manual,
}

/// Run-wide switches
#[derive(Debug, Clone, Copy, Default)]
pub struct ManagerSettings {
    pub mode: Mode,
    pub dry_run: bool,
    pub on_create_error: CreateFailurePolicy,
}

/// Orchestrates reconciliation across collections
pub struct IndexManager {
    store: Arc<dyn IndexStore>,
    settings: ManagerSettings,
    collections: Vec<CollectionIndexes>,
}

impl IndexManager {
    pub fn new(
        store: Arc<dyn IndexStore>,
        settings: ManagerSettings,
        collections: Vec<CollectionIndexes>,
    ) -> Self {
        Self {
            store,
            settings,
            collections,
        }
    }

    pub fn collections(&self) -> &[CollectionIndexes] {
        &self.collections
    }

    fn run_span(&self, run_id: Uuid) -> Span {
        tracing::info_span!(
            "indexsync_run",
            %run_id,
            db = %self.store.database_name(),
            mode = ?self.settings.mode,
            dry_run = self.settings.dry_run
        )
    }

    /// Reconcile every configured collection in order
    ///
    /// The first collection whose indexes cannot be listed ends the run:
    /// the report keeps every collection reconciled before it, sets
    /// `read_failure` and `aborted`, and later collections are not touched.
    pub async fn ensure(&self) -> Result<RunReport, IndexServiceError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = self.run_span(run_id);

        if self.settings.mode == Mode::Manual {
            tracing::info!(parent: &span, "manual mode reconciles the same way as auto mode");
        }

        let options = ReconcileOptions {
            dry_run: self.settings.dry_run,
            on_create_error: self.settings.on_create_error,
        };

        let mut reports = Vec::with_capacity(self.collections.len());
        let mut aborted = false;
        let mut read_failure = None;

        for collection in &self.collections {
            let reconciler =
                match CollectionReconciler::new(self.store.as_ref(), &collection.name, &span, options)
                    .await
                {
                    Ok(reconciler) => reconciler,
                    Err(IndexServiceError::StoreRead { source, .. }) => {
                        let kind = source.kind();
                        let err = IndexServiceError::store_read(&collection.name, source);
                        tracing::error!(parent: &span, error = %err, "aborting run");
                        read_failure = Some(ReadFailure {
                            collection: collection.name.clone(),
                            kind,
                            error: err.to_string(),
                        });
                        aborted = true;
                        break;
                    }
                    Err(err) => return Err(err),
                };

            let report = reconciler.ensure(&collection.indexes).await;
            let stop = report.aborted;
            reports.push(report);

            if stop {
                aborted = true;
                break;
            }
        }

        let report = RunReport {
            run_id,
            database: self.store.database_name().to_string(),
            mode: self.settings.mode,
            dry_run: self.settings.dry_run,
            started_at,
            finished_at: Utc::now(),
            collections: reports,
            read_failure,
            aborted,
        };

        tracing::info!(
            parent: &span,
            created = report.created_count(),
            planned = report.planned_count(),
            rebuilds = report.rebuild_count(),
            failures = report.failure_count(),
            aborted,
            "index reconciliation finished"
        );

        Ok(report)
    }

    /// Read the catalog of every configured collection without classifying
    pub async fn list_catalogs(&self) -> Result<Vec<Catalog>, IndexServiceError> {
        let span = self.run_span(Uuid::new_v4());
        let mut catalogs = Vec::with_capacity(self.collections.len());

        for collection in &self.collections {
            let catalog = read_catalog(self.store.as_ref(), &collection.name)
                .instrument(span.clone())
                .await?;
            tracing::debug!(
                parent: &span,
                coll = %collection.name,
                count = catalog.len(),
                "catalog read"
            );
            catalogs.push(catalog);
        }

        Ok(catalogs)
    }
}
