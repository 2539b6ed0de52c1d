//! Reconciliation reports
//!
//! Every desired index gets a [`SpecOutcome`], grouped per collection and per
//! run, so callers see each create failure and each pending rebuild instead
//! of a single pass/fail.

use super::{Decision, Mode};
use crate::db::StoreErrorKind;
use crate::models::KeySequence;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// What the reconciler did for one desired index
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Already satisfied, nothing written
    Unchanged,
    /// Index created under `name`
    Created { name: String },
    /// Would be created (dry run)
    Planned,
    /// `existing` must be dropped and recreated; not performed
    RebuildNotImplemented { existing: String },
    /// The create command failed
    Failed { kind: StoreErrorKind, error: String },
    /// Not attempted because an earlier create failed under the abort policy
    Skipped,
}

/// Result for one desired index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecOutcome {
    /// Explicit or generated index name
    pub index: String,
    pub keys: KeySequence,
    pub decision: Decision,
    pub action: Action,
}

/// Results for one collection
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub collection: String,
    /// Index names in the catalog snapshot the decisions were made against
    pub existing_indexes: Vec<String>,
    pub outcomes: Vec<SpecOutcome>,
    /// A create failed and the remaining specs were skipped
    pub aborted: bool,
}

impl CollectionReport {
    fn count(&self, predicate: impl Fn(&Action) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| predicate(&outcome.action))
            .count()
    }

    pub fn created_count(&self) -> usize {
        self.count(|action| matches!(action, Action::Created { .. }))
    }

    pub fn planned_count(&self) -> usize {
        self.count(|action| matches!(action, Action::Planned))
    }

    pub fn rebuild_count(&self) -> usize {
        self.count(|action| matches!(action, Action::RebuildNotImplemented { .. }))
    }

    pub fn failure_count(&self) -> usize {
        self.count(|action| matches!(action, Action::Failed { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = &SpecOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.action, Action::Failed { .. }))
    }
}

/// Results for a whole run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub database: String,
    pub mode: Mode,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub collections: Vec<CollectionReport>,
    /// The collection whose catalog could not be read, if any
    pub read_failure: Option<ReadFailure>,
    /// Processing stopped early, after a create failure under the abort
    /// policy or a catalog read failure
    pub aborted: bool,
}

/// A catalog read that stopped the run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadFailure {
    pub collection: String,
    pub kind: StoreErrorKind,
    pub error: String,
}

impl RunReport {
    pub fn created_count(&self) -> usize {
        self.collections.iter().map(CollectionReport::created_count).sum()
    }

    pub fn planned_count(&self) -> usize {
        self.collections.iter().map(CollectionReport::planned_count).sum()
    }

    pub fn rebuild_count(&self) -> usize {
        self.collections.iter().map(CollectionReport::rebuild_count).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.collections.iter().map(CollectionReport::failure_count).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.read_failure.is_some() || self.failure_count() > 0
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionReport> {
        self.collections.iter().find(|report| report.collection == name)
    }
}
