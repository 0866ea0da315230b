//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The pipeline reaches it through `ExceptionRepository` and never
//! executes SQL directly.

use crate::{
    error::LedgerResult,
    model::ExceptionRecord,
};
use rusqlite::{Connection, Row};

mod ledger;
mod run;
mod source;
mod staging;

pub use run::JobRunRow;

/// Column list shared by the ledger and history tables, in schema order.
pub(crate) const EXCEPTION_COLUMNS: &str = "exception_id, due_id, customer_id, exception_date, \
     exception_reason, exception_status, exception_update_date, exception_update_remarks";

pub struct WarehouseStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl WarehouseStore {
    pub fn open(path: &str) -> LedgerResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        log::debug!("Opened warehouse at {path}");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> LedgerResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order. Safe to re-run.
    pub fn migrate(&self) -> LedgerResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_warehouse.sql"))?;
        Ok(())
    }

    /// Run `f` inside one transaction: committed if `f` succeeds, rolled
    /// back otherwise. Store methods called from `f` join the transaction.
    pub fn in_transaction<T>(&self, f: impl FnOnce(&Self) -> LedgerResult<T>) -> LedgerResult<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    /// Row count of a persistent table. `table` must be a trusted name.
    pub fn table_count(&self, table: &str) -> LedgerResult<i64> {
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count)
    }

    fn map_exception_row(row: &Row<'_>) -> rusqlite::Result<ExceptionRecord> {
        Ok(ExceptionRecord {
            exception_id: row.get(0)?,
            due_id: row.get(1)?,
            customer_id: row.get(2)?,
            exception_date: row.get(3)?,
            exception_reason: row.get(4)?,
            exception_status: row.get(5)?,
            exception_update_date: row.get(6)?,
            exception_update_remarks: row.get(7)?,
        })
    }
}
