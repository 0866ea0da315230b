//! Shared primitive types used across the job.

use chrono::NaiveDate;

/// The business date a run executes for. Ledger rows are stamped with it.
pub type RunDate = NaiveDate;

/// Ledger-wide exception identifier, drawn from one shared sequence.
pub type ExceptionId = i64;

/// A stable identifier for a source-table entity (customer, due, ...).
pub type EntityId = String;

/// The canonical run identifier (uuid v4, stored in `job_run`).
pub type RunId = String;
