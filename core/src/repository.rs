//! Data-access seam between the pipeline and the warehouse.
//!
//! The pipeline depends only on [`ExceptionRepository`]. `WarehouseStore`
//! is the production implementation; unit tests substitute the generated
//! `MockExceptionRepository`.

use crate::{
    config::{ReconcilePolicy, StagingFilter},
    error::LedgerResult,
    model::SourceKind,
    pipeline::RunSummary,
    store::WarehouseStore,
    types::{ExceptionId, RunDate},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of appending a run's exceptions to the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derivation {
    /// First id handed out this run.
    pub first_id: ExceptionId,
    /// First id the next run will receive.
    pub next_id: ExceptionId,
    pub per_source: BTreeMap<SourceKind, usize>,
}

impl Derivation {
    pub fn total(&self) -> usize {
        self.per_source.values().sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub closed: usize,
    pub still_open: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// Everything the pipeline needs from the warehouse, one call per step.
///
/// Implementations make `append_exceptions`, `archive_stale` and
/// `reconcile` atomic: each either fully applies or leaves the ledger as
/// it was.
#[cfg_attr(test, mockall::automock)]
pub trait ExceptionRepository {
    /// Create the staging table for `source`. Returns rows staged.
    fn stage(&self, source: SourceKind, filter: &StagingFilter) -> LedgerResult<usize>;

    /// Drop the staging table for `source`. A missing table is not an error.
    fn drop_stage(&self, source: SourceKind) -> LedgerResult<()>;

    /// Append one Open exception per staged row, dated `run_date`.
    fn append_exceptions(&self, run_date: RunDate) -> LedgerResult<Derivation>;

    /// Move ledger rows dated before `run_date` to history. Returns rows moved.
    fn archive_stale(&self, run_date: RunDate) -> LedgerResult<usize>;

    /// Apply linked payment records to open exceptions.
    fn reconcile(&self, run_date: RunDate, policy: &ReconcilePolicy) -> LedgerResult<Reconciliation>;

    /// Persist the audit row for a finished run.
    fn record_run(&self, summary: &RunSummary, status: RunStatus) -> LedgerResult<()>;
}

impl ExceptionRepository for WarehouseStore {
    fn stage(&self, source: SourceKind, filter: &StagingFilter) -> LedgerResult<usize> {
        self.create_staging(source, filter)
    }

    fn drop_stage(&self, source: SourceKind) -> LedgerResult<()> {
        self.drop_staging(source)
    }

    fn append_exceptions(&self, run_date: RunDate) -> LedgerResult<Derivation> {
        self.derive_exceptions(run_date)
    }

    fn archive_stale(&self, run_date: RunDate) -> LedgerResult<usize> {
        self.archive_before(run_date)
    }

    fn reconcile(&self, run_date: RunDate, policy: &ReconcilePolicy) -> LedgerResult<Reconciliation> {
        self.reconcile_payments(run_date, policy)
    }

    fn record_run(&self, summary: &RunSummary, status: RunStatus) -> LedgerResult<()> {
        self.insert_job_run(summary, status.as_str())
    }
}
