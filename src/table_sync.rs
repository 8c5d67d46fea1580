//! Full-replace sync of a single table.

use crate::catalog::TableSpec;
use crate::column_map::ColumnMap;
use crate::destination::Destination;
use crate::insert::{DEFAULT_BATCH_SIZE, InsertBatch, batches};
use crate::normalize::Row;
use crate::report::{RowError, TableOutcome};
use crate::source::Source;
use crate::table::Table;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncOptions {
    pub batch_size: usize,
    /// Wrap each table's delete and inserts in one transaction.
    pub transactional: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            transactional: true,
        }
    }
}

/// Replaces the destination's copy of one table with the source's rows.
///
/// An empty source leaves the destination untouched. Otherwise the destination table is
/// emptied and refilled in batches. A rejected batch is retried row by row so one bad row
/// costs only itself. Failures never escape: they are logged and recorded in the outcome.
pub fn sync_table<S, D>(
    spec: &TableSpec,
    source: &mut S,
    destination: &mut D,
    options: &SyncOptions,
) -> TableOutcome
where
    S: Source + ?Sized,
    D: Destination + ?Sized,
{
    let table = spec.table();
    let mut outcome = TableOutcome::new(spec.name);

    log::info!("Fetching {table}");
    let rows = match source.fetch_rows(&table) {
        Ok(rows) => rows,
        Err(err) => {
            log::error!("{err}");
            return outcome.failed(err);
        }
    };
    outcome.fetched = rows.len();
    log::info!("Fetched {} rows from {table}", rows.len());
    if rows.is_empty() {
        return outcome.finish();
    }

    if options.transactional {
        if let Err(err) = destination.begin(&table) {
            log::error!("{err}");
            return outcome.failed(err);
        }
    }

    log::info!("Clearing {table}");
    match destination.delete_all(&table) {
        Ok(deleted) => outcome.deleted = Some(deleted),
        Err(err) => {
            log::error!("{err}");
            if options.transactional {
                if let Err(rollback_err) = destination.rollback(&table) {
                    log::error!("{rollback_err}");
                }
            }
            return outcome.failed(err);
        }
    }

    let columns = load_columns(spec, &table, destination);
    insert_rows(&table, &rows, &columns, destination, options.batch_size, &mut outcome);

    if options.transactional {
        if let Err(err) = destination.commit(&table) {
            log::error!("{err}");
            outcome.inserted = 0;
            return outcome.failed(err);
        }
    }
    if outcome.inserted > 0 {
        if let Err(err) = destination.reset_sequences(&table) {
            log::warn!("{err}");
        }
    }
    outcome.finish()
}

fn load_columns<D: Destination + ?Sized>(
    spec: &TableSpec,
    table: &Table,
    destination: &mut D,
) -> ColumnMap {
    match destination.columns(table) {
        Ok(columns) => spec.column_map().with_introspected(&columns),
        Err(err) => {
            log::warn!("Could not read column types of {table}, using declared encodings: {err}");
            spec.column_map()
        }
    }
}

fn insert_rows<D: Destination + ?Sized>(
    table: &Table,
    rows: &[Row],
    columns: &ColumnMap,
    destination: &mut D,
    batch_size: usize,
    outcome: &mut TableOutcome,
) {
    let batch_size = batch_size.max(1);
    for (number, chunk) in batches(rows, batch_size).enumerate() {
        let offset = number * batch_size;
        outcome.batches += 1;
        match InsertBatch::build(table, chunk, columns).and_then(|b| destination.insert(&b)) {
            Ok(inserted) => outcome.inserted += inserted as usize,
            Err(err) if chunk.len() == 1 => {
                outcome.failed_batches += 1;
                log::warn!("Row {offset} of {table} rejected: {err}");
                outcome.row_errors.push(RowError {
                    index: offset,
                    message: err.to_string(),
                });
            }
            Err(err) => {
                outcome.failed_batches += 1;
                log::warn!(
                    "Batch {} of {table} rejected, retrying its {} rows one at a time: {err}",
                    number + 1,
                    chunk.len()
                );
                for (i, row) in chunk.iter().enumerate() {
                    let single = std::slice::from_ref(row);
                    match InsertBatch::build(table, single, columns)
                        .and_then(|b| destination.insert(&b))
                    {
                        Ok(inserted) => outcome.inserted += inserted as usize,
                        Err(err) => {
                            log::warn!("Row {} of {table} rejected: {err}", offset + i);
                            outcome.row_errors.push(RowError {
                                index: offset + i,
                                message: err.to_string(),
                            });
                        }
                    }
                }
            }
        }
    }
}
