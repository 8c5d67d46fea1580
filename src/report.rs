//! Typed results of a sync run.

use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    /// Every fetched row landed.
    Synced,
    /// Some rows landed, some were rejected.
    Partial,
    /// The source had no rows; the destination was left alone.
    Skipped,
    /// Nothing landed: fetch, delete or commit failed, or every row was rejected.
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// Position of the row in fetch order.
    pub index: usize,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableOutcome {
    pub table: String,
    pub status: TableStatus,
    pub fetched: usize,
    pub deleted: Option<u64>,
    pub inserted: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub error: Option<String>,
    pub row_errors: Vec<RowError>,
}

impl TableOutcome {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            status: TableStatus::Skipped,
            fetched: 0,
            deleted: None,
            inserted: 0,
            batches: 0,
            failed_batches: 0,
            error: None,
            row_errors: Vec::new(),
        }
    }

    pub fn failed(mut self, error: impl ToString) -> Self {
        self.status = TableStatus::Failed;
        self.error = Some(error.to_string());
        self
    }

    /// Settles the status from the row counts once inserts are done.
    pub fn finish(mut self) -> Self {
        self.status = if self.fetched == 0 {
            TableStatus::Skipped
        } else if self.inserted == self.fetched {
            TableStatus::Synced
        } else if self.inserted == 0 {
            TableStatus::Failed
        } else {
            TableStatus::Partial
        };
        self
    }

    pub fn log(&self) {
        match self.status {
            TableStatus::Synced => log::info!(
                "{}: synced {} of {} rows",
                self.table,
                self.inserted,
                self.fetched
            ),
            TableStatus::Skipped => log::info!("{}: skipped, no rows in source", self.table),
            TableStatus::Partial => log::warn!(
                "{}: partially synced {} of {} rows ({} rows rejected)",
                self.table,
                self.inserted,
                self.fetched,
                self.row_errors.len()
            ),
            TableStatus::Failed => log::error!(
                "{}: failed, {} of {} rows synced: {}",
                self.table,
                self.inserted,
                self.fetched,
                self.error.as_deref().unwrap_or("every row was rejected")
            ),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub synced: usize,
    pub partial: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rows_fetched: usize,
    pub rows_inserted: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub source: String,
    pub destination: String,
    pub tables: Vec<TableOutcome>,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

fn serialize_secs<S: serde::Serializer>(elapsed: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(elapsed.as_secs_f64())
}

impl SyncReport {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            source: source.into(),
            destination: destination.into(),
            tables: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn outcome(&self, table: &str) -> Option<&TableOutcome> {
        self.tables.iter().find(|t| t.table == table)
    }

    pub fn summary(&self) -> Summary {
        self.tables.iter().fold(Summary::default(), |mut acc, t| {
            match t.status {
                TableStatus::Synced => acc.synced += 1,
                TableStatus::Partial => acc.partial += 1,
                TableStatus::Skipped => acc.skipped += 1,
                TableStatus::Failed => acc.failed += 1,
            }
            acc.rows_fetched += t.fetched;
            acc.rows_inserted += t.inserted;
            acc
        })
    }

    /// True when no table failed or lost rows.
    pub fn is_complete(&self) -> bool {
        let summary = self.summary();
        summary.partial == 0 && summary.failed == 0
    }

    pub fn log_summary(&self) {
        let s = self.summary();
        log::info!(
            "Run {} finished in {:.1}s: {} synced, {} partial, {} skipped, {} failed ({} of {} rows inserted)",
            self.run_id,
            self.elapsed.as_secs_f64(),
            s.synced,
            s.partial,
            s.skipped,
            s.failed,
            s.rows_inserted,
            s.rows_fetched
        );
    }
}
