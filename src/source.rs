//! Where rows come from.

use crate::db::PgConnection;
use crate::error::SyncError;
use crate::normalize::Row;
use crate::table::Table;
use serde_json::Value;

/// A place full-table row sets can be read from.
pub trait Source {
    /// Every row of `table`, in whatever order the source returns them.
    fn fetch_rows(&mut self, table: &Table) -> Result<Vec<Row>, SyncError>;

    /// Releases the underlying connection. Called once by the orchestrator.
    fn close(&mut self) {}
}

impl Source for PgConnection {
    fn fetch_rows(&mut self, table: &Table) -> Result<Vec<Row>, SyncError> {
        // row_to_json keeps column names and lets every column type come back uniformly.
        let query = format!("SELECT row_to_json(t) FROM {} t", table.quoted());
        let rows = self
            .client()?
            .query(&query, &[])
            .map_err(|e| SyncError::fetch(table, e))?;
        rows.iter()
            .map(|row| match row.try_get::<_, Value>(0) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(other) => Err(SyncError::fetch(
                    table,
                    format!("expected a JSON object per row, got {other}"),
                )),
                Err(e) => Err(SyncError::fetch(table, e)),
            })
            .collect()
    }

    fn close(&mut self) {
        PgConnection::close(self);
    }
}
