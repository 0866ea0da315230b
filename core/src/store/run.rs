use super::WarehouseStore;
use crate::{error::LedgerResult, pipeline::RunSummary};
use rusqlite::{params, OptionalExtension};

/// A persisted `job_run` row.
#[derive(Debug, Clone)]
pub struct JobRunRow {
    pub run_id: String,
    pub run_date: String,
    pub status: String,
    pub summary_json: Option<String>,
}

impl WarehouseStore {
    // ── Run audit ─────────────────────────────────────────────────

    pub fn insert_job_run(&self, summary: &RunSummary, status: &str) -> LedgerResult<()> {
        self.conn.execute(
            "INSERT INTO job_run (run_id, run_date, status, summary_json, started_at, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                summary.run_id,
                summary.run_date,
                status,
                serde_json::to_string(summary)?,
                summary.started_at.to_rfc3339(),
                summary.finished_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    pub fn job_run(&self, run_id: &str) -> LedgerResult<Option<JobRunRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT run_id, run_date, status, summary_json FROM job_run WHERE run_id = ?1",
                params![run_id],
                Self::map_job_run_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn job_runs(&self) -> LedgerResult<Vec<JobRunRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, run_date, status, summary_json FROM job_run
             ORDER BY started_at ASC, run_id ASC",
        )?;
        let rows = stmt
            .query_map([], Self::map_job_run_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_job_run_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<JobRunRow> {
        Ok(JobRunRow {
            run_id: row.get(0)?,
            run_date: row.get(1)?,
            status: row.get(2)?,
            summary_json: row.get(3)?,
        })
    }
}
