//! The exception ledger job.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Staging         four TEMP snapshots of the source tables
//!   2. Derivation      one Open exception per staged row
//!   3. Archival        ledger rows dated before the run date move to history
//!   4. Reconciliation  linked payment records close or annotate exceptions
//!   5. Teardown        staging tables dropped
//!   6. Audit           one job_run row
//!
//! RULES:
//!   - Steps run sequentially against one repository.
//!   - Derivation, archival and reconciliation are each a single transaction.
//!   - The first failing step aborts the remaining steps.
//!   - Teardown and audit run on every exit path.

use crate::{
    config::JobConfig,
    error::LedgerResult,
    model::SourceKind,
    repository::{Derivation, ExceptionRepository, Reconciliation, RunStatus},
    types::{RunDate, RunId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// What one run did. Persisted as JSON in `job_run.summary_json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub run_date: RunDate,
    pub staged: BTreeMap<SourceKind, usize>,
    pub derivation: Derivation,
    pub archived: usize,
    pub reconciliation: Reconciliation,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Set when the run aborted.
    pub error: Option<String>,
}

impl RunSummary {
    pub fn new(run_id: RunId, run_date: RunDate) -> Self {
        Self {
            run_id,
            run_date,
            staged: BTreeMap::new(),
            derivation: Derivation::default(),
            archived: 0,
            reconciliation: Reconciliation::default(),
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        }
    }

    pub fn total_staged(&self) -> usize {
        self.staged.values().sum()
    }
}

pub struct Pipeline<'a, R: ExceptionRepository> {
    repo: &'a R,
    config: JobConfig,
}

impl<'a, R: ExceptionRepository> Pipeline<'a, R> {
    pub fn new(repo: &'a R, config: JobConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Execute one run for `run_date`.
    ///
    /// On failure the staging tables are still dropped and a `failed`
    /// audit row is written; the error of the step that failed is returned.
    pub fn run(&self, run_date: RunDate) -> LedgerResult<RunSummary> {
        let mut summary = RunSummary::new(Uuid::new_v4().to_string(), run_date);
        log::info!("Run {} started for {run_date}", summary.run_id);

        let steps = self.run_steps(run_date, &mut summary);
        let result = steps.and(self.teardown());
        summary.finished_at = Some(Utc::now());

        match result {
            Ok(()) => {
                self.repo.record_run(&summary, RunStatus::Succeeded)?;
                log::info!(
                    "Run {} finished: staged={} derived={} archived={} closed={} still_open={}",
                    summary.run_id,
                    summary.total_staged(),
                    summary.derivation.total(),
                    summary.archived,
                    summary.reconciliation.closed,
                    summary.reconciliation.still_open,
                );
                Ok(summary)
            }
            Err(e) => {
                log::error!("Run {} aborted: {e}", summary.run_id);
                summary.error = Some(e.to_string());
                if let Err(audit) = self.repo.record_run(&summary, RunStatus::Failed) {
                    log::warn!("Could not record failed run {}: {audit}", summary.run_id);
                }
                Err(e)
            }
        }
    }

    fn run_steps(&self, run_date: RunDate, summary: &mut RunSummary) -> LedgerResult<()> {
        for source in SourceKind::ALL {
            let filter = self.config.staging.filter_for(source);
            let staged = self.repo.stage(source, filter)?;
            log::info!("Staged {staged} {source} rows");
            summary.staged.insert(source, staged);
        }

        summary.derivation = self.repo.append_exceptions(run_date)?;
        log::info!(
            "Derived {} exceptions (ids {}..{})",
            summary.derivation.total(),
            summary.derivation.first_id,
            summary.derivation.next_id,
        );

        summary.archived = self.repo.archive_stale(run_date)?;
        log::info!("Archived {} exceptions dated before {run_date}", summary.archived);

        summary.reconciliation = self.repo.reconcile(run_date, &self.config.reconciliation)?;
        log::info!(
            "Reconciled payments: {} closed, {} still open",
            summary.reconciliation.closed,
            summary.reconciliation.still_open,
        );
        Ok(())
    }

    /// Drop every staging table, even after an earlier drop failed.
    /// Returns the first drop error.
    fn teardown(&self) -> LedgerResult<()> {
        let mut first_err = None;
        for source in SourceKind::ALL {
            if let Err(e) = self.repo.drop_stage(source) {
                log::warn!("Failed to drop staging table for {source}: {e}");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
