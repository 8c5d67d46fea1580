//! Where rows go.

use crate::db::PgConnection;
use crate::error::SyncError;
use crate::insert::InsertBatch;
use crate::table::{ColumnInfo, Table, quote_ident};

const BATCH_SAVEPOINT: &str = "content_sync_batch";

/// A database tables are fully replaced in.
pub trait Destination {
    /// Opens a transaction spanning one table's delete and inserts.
    fn begin(&mut self, table: &Table) -> Result<(), SyncError>;

    /// Deletes every row of `table`, returning how many went.
    fn delete_all(&mut self, table: &Table) -> Result<u64, SyncError>;

    /// Inserts one batch. A failed batch leaves no rows behind and does not poison an
    /// open transaction.
    fn insert(&mut self, batch: &InsertBatch) -> Result<u64, SyncError>;

    fn commit(&mut self, table: &Table) -> Result<(), SyncError>;

    fn rollback(&mut self, table: &Table) -> Result<(), SyncError>;

    /// Moves every sequence owned by a column of `table` past the column's largest value,
    /// so rows inserted later without an explicit key do not collide with copied ones.
    fn reset_sequences(&mut self, _table: &Table) -> Result<(), SyncError> {
        Ok(())
    }

    /// Column names and types, used to pick value encodings.
    fn columns(&mut self, _table: &Table) -> Result<Vec<ColumnInfo>, SyncError> {
        Ok(Vec::new())
    }

    /// Releases the underlying connection. Called once by the orchestrator.
    fn close(&mut self) {}
}

impl Destination for PgConnection {
    fn begin(&mut self, table: &Table) -> Result<(), SyncError> {
        self.client()?
            .batch_execute("BEGIN")
            .map_err(|e| SyncError::delete(table, e))?;
        self.in_transaction = true;
        Ok(())
    }

    fn delete_all(&mut self, table: &Table) -> Result<u64, SyncError> {
        let statement = format!("DELETE FROM {}", table.quoted());
        self.client()?
            .execute(&statement, &[])
            .map_err(|e| SyncError::delete(table, e))
    }

    fn insert(&mut self, batch: &InsertBatch) -> Result<u64, SyncError> {
        let sql = batch.sql();
        let params = batch.params();
        let in_transaction = self.in_transaction;
        let client = self.client()?;
        if !in_transaction {
            return client
                .execute(&sql, &params)
                .map_err(|e| SyncError::insert(&batch.table, e));
        }
        client
            .batch_execute(&format!("SAVEPOINT {BATCH_SAVEPOINT}"))
            .map_err(|e| SyncError::insert(&batch.table, e))?;
        match client.execute(&sql, &params) {
            Ok(inserted) => {
                client
                    .batch_execute(&format!("RELEASE SAVEPOINT {BATCH_SAVEPOINT}"))
                    .map_err(|e| SyncError::insert(&batch.table, e))?;
                Ok(inserted)
            }
            Err(err) => {
                client
                    .batch_execute(&format!(
                        "ROLLBACK TO SAVEPOINT {BATCH_SAVEPOINT}; RELEASE SAVEPOINT {BATCH_SAVEPOINT}"
                    ))
                    .map_err(|e| SyncError::insert(&batch.table, e))?;
                Err(SyncError::insert(&batch.table, err))
            }
        }
    }

    fn commit(&mut self, table: &Table) -> Result<(), SyncError> {
        self.in_transaction = false;
        self.client()?
            .batch_execute("COMMIT")
            .map_err(|e| SyncError::commit(table, e))
    }

    fn rollback(&mut self, table: &Table) -> Result<(), SyncError> {
        self.in_transaction = false;
        self.client()?
            .batch_execute("ROLLBACK")
            .map_err(|e| SyncError::commit(table, e))
    }

    fn reset_sequences(&mut self, table: &Table) -> Result<(), SyncError> {
        let qualified = table.quoted();
        let client = self.client()?;
        let owned = client
            .query(
                "SELECT a.attname::text, pg_get_serial_sequence($1::text, a.attname) \
                 FROM pg_attribute a \
                 WHERE a.attrelid = $1::text::regclass AND a.attnum > 0 AND NOT a.attisdropped \
                 AND pg_get_serial_sequence($1::text, a.attname) IS NOT NULL",
                &[&qualified],
            )
            .map_err(|e| SyncError::sequence(table, e))?;
        for row in owned {
            let column: String = row.get(0);
            let sequence: String = row.get(1);
            let statement = format!(
                "SELECT setval($1::text::regclass, COALESCE(MAX({}), 0) + 1, false) FROM {qualified}",
                quote_ident(&column)
            );
            client
                .query_one(&statement, &[&sequence])
                .map_err(|e| SyncError::sequence(table, e))?;
            log::debug!("Reset {sequence} after {column} of {table}");
        }
        Ok(())
    }

    fn columns(&mut self, table: &Table) -> Result<Vec<ColumnInfo>, SyncError> {
        table
            .get_columns(self.client()?)
            .map_err(|e| SyncError::fetch(table, e))
    }

    fn close(&mut self) {
        PgConnection::close(self);
    }
}
