use crate::catalog::TableSpec;
use crate::destination::Destination;
use crate::report::SyncReport;
use crate::source::Source;
use crate::table_sync::{SyncOptions, sync_table};
use std::time::Instant;

/// Runs a full-replace sync of every planned table, in plan order, once.
///
/// Owns both connections for the run and releases each exactly once, whether the run
/// completes or unwinds.
pub struct MigrationOrchestrator<S: Source, D: Destination> {
    source: S,
    destination: D,
    plan: Vec<TableSpec>,
    options: SyncOptions,
    source_label: String,
    destination_label: String,
    closed: bool,
}

impl<S: Source, D: Destination> MigrationOrchestrator<S, D> {
    pub fn new(source: S, destination: D, plan: Vec<TableSpec>, options: SyncOptions) -> Self {
        Self {
            source,
            destination,
            plan,
            options,
            source_label: "source".to_string(),
            destination_label: "destination".to_string(),
            closed: false,
        }
    }

    pub fn with_labels(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.source_label = source.into();
        self.destination_label = destination.into();
        self
    }

    pub fn orchestrate(mut self) -> SyncReport {
        let started = Instant::now();
        let mut report = SyncReport::new(&self.source_label, &self.destination_label);
        log::info!(
            "Starting run {}: {} tables from {} to {} (batch size {}, {})",
            report.run_id,
            self.plan.len(),
            self.source_label,
            self.destination_label,
            self.options.batch_size,
            if self.options.transactional {
                "one transaction per table"
            } else {
                "no transactions"
            }
        );
        for spec in &self.plan {
            let outcome = sync_table(spec, &mut self.source, &mut self.destination, &self.options);
            outcome.log();
            report.tables.push(outcome);
        }
        self.close();
        report.elapsed = started.elapsed();
        report.log_summary();
        report
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.source.close();
        self.destination.close();
    }
}

impl<S: Source, D: Destination> Drop for MigrationOrchestrator<S, D> {
    fn drop(&mut self) {
        self.close();
    }
}
