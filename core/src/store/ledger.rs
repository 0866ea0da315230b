use super::{WarehouseStore, EXCEPTION_COLUMNS};
use crate::{
    config::ReconcilePolicy,
    error::{LedgerError, LedgerResult},
    model::{ExceptionRecord, ExceptionStatus, SourceKind},
    repository::{Derivation, Reconciliation},
    types::{ExceptionId, RunDate},
};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;

impl WarehouseStore {
    // ── Identifier sequence ───────────────────────────────────────

    /// Next free id across ledger and history. Ids never repeat, even
    /// after the row that held them has been archived.
    pub fn next_exception_id(&self) -> LedgerResult<ExceptionId> {
        Self::next_exception_id_on(&self.conn)
    }

    fn next_exception_id_on(conn: &Connection) -> LedgerResult<ExceptionId> {
        let max: Option<ExceptionId> = conn.query_row(
            "SELECT MAX(exception_id) FROM (
                 SELECT exception_id FROM exception_records
                 UNION ALL
                 SELECT exception_id FROM exception_records_hist
             )",
            [],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0) + 1)
    }

    // ── Derivation ────────────────────────────────────────────────

    /// Append one Open exception per staged row, for all four sources,
    /// in a single transaction. Ids continue from one source to the next.
    pub fn derive_exceptions(&self, run_date: RunDate) -> LedgerResult<Derivation> {
        let tx = self.conn.unchecked_transaction()?;
        let first_id = Self::next_exception_id_on(&tx)?;
        let mut next_id = first_id;
        let mut per_source = BTreeMap::new();

        for source in SourceKind::ALL {
            let due_id = if source.carries_due_id() { "due_id" } else { "NULL" };
            let sql = format!(
                "INSERT INTO exception_records ({EXCEPTION_COLUMNS})
                 SELECT ?1 + ROW_NUMBER() OVER (ORDER BY customer_id, {key}) - 1,
                        {due_id}, customer_id, ?2, ?3, ?4, NULL, NULL
                 FROM temp.{staging}",
                key = source.key_column(),
                staging = source.staging_table(),
            );
            let inserted = tx.execute(
                &sql,
                params![next_id, run_date, source.reason().as_str(), ExceptionStatus::Open],
            )?;
            log::debug!("Derived {inserted} {source} exceptions starting at id {next_id}");
            next_id += inserted as ExceptionId;
            per_source.insert(source, inserted);
        }

        tx.commit()?;
        Ok(Derivation {
            first_id,
            next_id,
            per_source,
        })
    }

    // ── Archival ──────────────────────────────────────────────────

    /// Move ledger rows dated before `run_date` into history. Copy and
    /// delete commit together or not at all.
    pub fn archive_before(&self, run_date: RunDate) -> LedgerResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let copied = tx.execute(
            &format!(
                "INSERT INTO exception_records_hist ({EXCEPTION_COLUMNS})
                 SELECT {EXCEPTION_COLUMNS} FROM exception_records
                 WHERE exception_date < ?1"
            ),
            params![run_date],
        )?;
        let deleted = tx.execute(
            "DELETE FROM exception_records WHERE exception_date < ?1",
            params![run_date],
        )?;
        if copied != deleted {
            // tx rolls back on drop.
            return Err(LedgerError::ArchiveMismatch { copied, deleted });
        }
        tx.commit()?;
        Ok(copied)
    }

    // ── Reconciliation ────────────────────────────────────────────

    /// Apply linked payment records to open exceptions.
    ///
    /// Paid → Closed with the closed remark. Linked but unpaid → stays Open
    /// with the pending remark. Unlinked and Closed rows are not touched.
    pub fn reconcile_payments(
        &self,
        run_date: RunDate,
        policy: &ReconcilePolicy,
    ) -> LedgerResult<Reconciliation> {
        let tx = self.conn.unchecked_transaction()?;
        let closed = tx.execute(
            "UPDATE exception_records
             SET exception_status = ?1,
                 exception_update_date = ?2,
                 exception_update_remarks = ?3
             WHERE exception_status = ?4
               AND due_id IS NOT NULL
               AND EXISTS (
                   SELECT 1 FROM payment_records p
                   WHERE p.due_id = exception_records.due_id
                     AND p.payment_status = ?5
               )",
            params![
                ExceptionStatus::Closed,
                run_date,
                policy.closed_remark,
                ExceptionStatus::Open,
                policy.paid_status,
            ],
        )?;
        let still_open = tx.execute(
            "UPDATE exception_records
             SET exception_update_date = ?1,
                 exception_update_remarks = ?2
             WHERE exception_status = ?3
               AND due_id IS NOT NULL
               AND EXISTS (
                   SELECT 1 FROM payment_records p
                   WHERE p.due_id = exception_records.due_id
               )",
            params![run_date, policy.pending_remark, ExceptionStatus::Open],
        )?;
        tx.commit()?;
        Ok(Reconciliation { closed, still_open })
    }

    // ── Queries ───────────────────────────────────────────────────

    pub fn insert_exception(&self, ex: &ExceptionRecord) -> LedgerResult<()> {
        self.conn.execute(
            &format!("INSERT INTO exception_records ({EXCEPTION_COLUMNS}) VALUES (?1,?2,?3,?4,?5,?6,?7,?8)"),
            params![
                ex.exception_id,
                ex.due_id,
                ex.customer_id,
                ex.exception_date,
                ex.exception_reason,
                ex.exception_status,
                ex.exception_update_date,
                ex.exception_update_remarks,
            ],
        )?;
        Ok(())
    }

    pub fn exception(&self, exception_id: ExceptionId) -> LedgerResult<Option<ExceptionRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {EXCEPTION_COLUMNS} FROM exception_records WHERE exception_id = ?1"),
                params![exception_id],
                Self::map_exception_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn ledger_rows(&self) -> LedgerResult<Vec<ExceptionRecord>> {
        self.exception_rows("exception_records")
    }

    pub fn history_rows(&self) -> LedgerResult<Vec<ExceptionRecord>> {
        self.exception_rows("exception_records_hist")
    }

    pub fn ledger_rows_for_customer(&self, customer_id: &str) -> LedgerResult<Vec<ExceptionRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EXCEPTION_COLUMNS} FROM exception_records
             WHERE customer_id = ?1
             ORDER BY exception_id ASC"
        ))?;
        let rows = stmt
            .query_map(params![customer_id], Self::map_exception_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn open_exception_count(&self) -> LedgerResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM exception_records WHERE exception_status = ?1",
            params![ExceptionStatus::Open],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn exception_rows(&self, table: &str) -> LedgerResult<Vec<ExceptionRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EXCEPTION_COLUMNS} FROM {table} ORDER BY exception_id ASC"
        ))?;
        let rows = stmt
            .query_map([], Self::map_exception_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
