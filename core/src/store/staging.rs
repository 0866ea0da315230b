use super::WarehouseStore;
use crate::{config::StagingFilter, error::LedgerResult, model::SourceKind};
use rusqlite::{params, params_from_iter};

impl WarehouseStore {
    // ── Staging ───────────────────────────────────────────────────

    /// Materialise the rows of `source` matching `filter` into its TEMP
    /// staging table. A table left over from an aborted run is replaced.
    /// Returns the number of rows staged.
    pub fn create_staging(&self, source: SourceKind, filter: &StagingFilter) -> LedgerResult<usize> {
        let predicate = filter.where_clause(source)?;
        let staging = source.staging_table();
        let table = source.source_table();

        self.conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS temp.{staging};
             CREATE TEMP TABLE {staging} AS SELECT * FROM main.{table} WHERE 0;"
        ))?;
        let staged = self.conn.execute(
            &format!("INSERT INTO temp.{staging} SELECT * FROM main.{table} WHERE {predicate}"),
            params_from_iter(filter.values()),
        )?;
        log::debug!("Staged {staged} rows from {table} into {staging} ({predicate})");
        Ok(staged)
    }

    pub fn drop_staging(&self, source: SourceKind) -> LedgerResult<()> {
        self.conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS temp.{};",
            source.staging_table()
        ))?;
        Ok(())
    }

    pub fn staging_exists(&self, source: SourceKind) -> LedgerResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_temp_master WHERE type = 'table' AND name = ?1",
            params![source.staging_table()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn staged_count(&self, source: SourceKind) -> LedgerResult<i64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM temp.{}", source.staging_table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count source rows satisfying `filter`, without staging them.
    pub fn count_matching(&self, source: SourceKind, filter: &StagingFilter) -> LedgerResult<i64> {
        let predicate = filter.where_clause(source)?;
        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM main.{} WHERE {predicate}",
                source.source_table()
            ),
            params_from_iter(filter.values()),
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
