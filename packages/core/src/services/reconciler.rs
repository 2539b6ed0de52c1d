//! Collection reconciler
//!
//! Brings one collection's indexes in line with its desired specs. The
//! catalog is read once when the reconciler is built and is not refreshed
//! afterwards, so every decision for the collection is made against the
//! same snapshot, including after creates.
//!
//! Store writes for `Create` are attempted one spec at a time. A failed
//! create is recorded on that spec; whether later specs are still attempted
//! is decided by [`CreateFailurePolicy`].

use super::{
    classify, read_catalog, Action, Catalog, Classification, CollectionReport,
    ConfigurationWarning, Decision, IndexServiceError, SpecOutcome,
};
use crate::db::{IndexStore, StoreError};
use crate::models::IndexSpec;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, Span};

/// What to do with the remaining specs after a create fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateFailurePolicy {
    /// Attempt every remaining spec (best effort)
    #[default]
    Continue,
    /// Skip the remaining specs and stop the run
    Abort,
}

/// Per-collection behaviour switches
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Classify only; report creates as `Planned`
    pub dry_run: bool,
    pub on_create_error: CreateFailurePolicy,
}

/// Reconciles the desired indexes of a single collection
pub struct CollectionReconciler<'a> {
    store: &'a dyn IndexStore,
    catalog: Catalog,
    options: ReconcileOptions,
    span: Span,
}

impl<'a> CollectionReconciler<'a> {
    /// Read the catalog of `collection` and prepare to reconcile it
    ///
    /// Log events are emitted in a `collection` span created under `parent`.
    ///
    /// # Errors
    ///
    /// [`IndexServiceError::StoreRead`] if the indexes cannot be listed.
    pub async fn new(
        store: &'a dyn IndexStore,
        collection: &str,
        parent: &Span,
        options: ReconcileOptions,
    ) -> Result<Self, IndexServiceError> {
        let span = tracing::info_span!(parent: parent, "collection", coll = %collection);
        let catalog = read_catalog(store, collection)
            .instrument(span.clone())
            .await?;

        tracing::info!(
            parent: &span,
            count = catalog.len(),
            indexes = ?catalog.names(),
            "existing indexes"
        );

        Ok(Self {
            store,
            catalog,
            options,
            span,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Classify and apply every spec, in order
    pub async fn ensure(&self, specs: &[IndexSpec]) -> CollectionReport {
        let mut outcomes = Vec::with_capacity(specs.len());
        let mut aborted = false;

        for spec in specs {
            let decision = classify(spec, &self.catalog);
            let action = if aborted {
                Action::Skipped
            } else {
                self.log_decision(spec, &decision);
                self.apply(spec, &decision).await
            };

            if matches!(action, Action::Failed { .. })
                && self.options.on_create_error == CreateFailurePolicy::Abort
            {
                tracing::warn!(
                    parent: &self.span,
                    remaining = specs.len() - outcomes.len() - 1,
                    "create failed, skipping remaining indexes"
                );
                aborted = true;
            }

            outcomes.push(SpecOutcome {
                index: spec.display_name(),
                keys: spec.keys.clone(),
                decision,
                action,
            });
        }

        CollectionReport {
            collection: self.catalog.collection().to_string(),
            existing_indexes: self.catalog.names().into_iter().map(String::from).collect(),
            outcomes,
            aborted,
        }
    }

    async fn apply(&self, spec: &IndexSpec, decision: &Decision) -> Action {
        match decision.classification {
            Classification::NoOp => Action::Unchanged,
            Classification::Rebuild => Action::RebuildNotImplemented {
                existing: decision
                    .by_name
                    .clone()
                    .unwrap_or_else(|| spec.display_name()),
            },
            Classification::Create if self.options.dry_run => Action::Planned,
            Classification::Create => match self.create(spec).await {
                Ok(name) => {
                    tracing::info!(parent: &self.span, index = %name, "index created");
                    Action::Created { name }
                }
                Err(source) => {
                    let kind = source.kind();
                    let err = IndexServiceError::store_write(
                        self.catalog.collection(),
                        spec.display_name(),
                        source,
                    );
                    tracing::error!(parent: &self.span, error = %err, "index creation failed");
                    Action::Failed {
                        kind,
                        error: err.to_string(),
                    }
                }
            },
        }
    }

    async fn create(&self, spec: &IndexSpec) -> Result<String, StoreError> {
        self.store
            .create_index(self.catalog.collection(), spec)
            .instrument(self.span.clone())
            .await
    }

    fn log_decision(&self, spec: &IndexSpec, decision: &Decision) {
        let index = spec.display_name();

        if let Some(name) = &decision.by_name {
            tracing::debug!(parent: &self.span, index = %name, "existing index found by name");
        }
        if let Some(name) = &decision.by_sequence {
            tracing::debug!(
                parent: &self.span,
                index = %name,
                keys = %spec.keys,
                "existing index found by key sequence"
            );
        }

        match &decision.warning {
            Some(warning @ ConfigurationWarning::RedundantIndexes { .. }) => {
                tracing::error!(parent: &self.span, index = %index, "{}", warning);
            }
            Some(warning) => {
                tracing::warn!(parent: &self.span, index = %index, keys = %spec.keys, "{}", warning);
            }
            None if decision.classification == Classification::Create => {
                tracing::info!(
                    parent: &self.span,
                    index = %index,
                    keys = %spec.keys,
                    "no index found with name or fields"
                );
            }
            None => {}
        }

        tracing::info!(
            parent: &self.span,
            index = %index,
            keys = %spec.keys,
            status = %decision.classification,
            "calculated index status"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryIndexStore;
    use crate::models::{ExistingIndex, KeySequence};

    fn keys(pairs: &[(&str, i32)]) -> KeySequence {
        pairs.iter().map(|(f, d)| (*f, *d)).collect()
    }

    #[tokio::test]
    async fn test_dry_run_never_writes() {
        let store = InMemoryIndexStore::new("shop").with_collection("products");
        let options = ReconcileOptions {
            dry_run: true,
            ..Default::default()
        };
        let reconciler = CollectionReconciler::new(&store, "products", &Span::none(), options)
            .await
            .unwrap();

        let report = reconciler
            .ensure(&[IndexSpec::new(keys(&[("item", 1)]))])
            .await;

        assert_eq!(report.outcomes[0].action, Action::Planned);
        assert_eq!(report.planned_count(), 1);
        assert!(store.create_requests().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_is_not_refreshed_after_create() {
        let store = InMemoryIndexStore::new("shop").with_collection("products");
        let reconciler =
            CollectionReconciler::new(&store, "products", &Span::none(), ReconcileOptions::default())
                .await
                .unwrap();

        let spec = IndexSpec::new(keys(&[("item", 1)])).with_name("item_1");
        let report = reconciler.ensure(&[spec.clone(), spec]).await;

        // Both were classified against the empty snapshot
        assert_eq!(report.outcomes[0].decision.classification, Classification::Create);
        assert_eq!(report.outcomes[1].decision.classification, Classification::Create);
        assert!(reconciler.catalog().is_empty());
        assert_eq!(store.create_requests().len(), 2);
        assert_eq!(store.list_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_rebuild_reports_existing_name() {
        let store = InMemoryIndexStore::new("shop")
            .with_index("products", ExistingIndex::new("by_item", keys(&[("sku", 1)])));
        let reconciler =
            CollectionReconciler::new(&store, "products", &Span::none(), ReconcileOptions::default())
                .await
                .unwrap();

        let report = reconciler
            .ensure(&[IndexSpec::new(keys(&[("item", 1)])).with_name("by_item")])
            .await;

        assert_eq!(
            report.outcomes[0].action,
            Action::RebuildNotImplemented {
                existing: "by_item".to_string()
            }
        );
        assert_eq!(report.existing_indexes, vec!["by_item".to_string()]);
    }
}
