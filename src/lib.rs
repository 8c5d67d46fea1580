//! Main library entry point for content-sync.

pub mod admin_api;
pub mod args;
pub mod catalog;
pub mod column_map;
pub mod config;
pub mod db;
pub mod destination;
pub mod error;
pub mod insert;
pub mod normalize;
pub mod orchestrator;
pub mod report;
pub mod snapshot;
pub mod source;
pub mod sql_value;
pub mod table;
pub mod table_sync;

#[cfg(test)]
pub(crate) mod memory;
#[cfg(test)]
pub(crate) mod test_server;

// Re-export key types for ergonomic access

pub use self::table::*;
pub use admin_api::{AdminApi, AdminApiConfig};
pub use catalog::{Catalog, TableSpec};
pub use column_map::*;
pub use db::PgConnection;
pub use destination::Destination;
pub use error::{ConfigError, SyncError};
pub use insert::{DEFAULT_BATCH_SIZE, InsertBatch};
pub use normalize::*;
pub use orchestrator::MigrationOrchestrator;
pub use report::*;
pub use snapshot::Snapshot;
pub use source::Source;
pub use sql_value::SqlValue;
pub use table_sync::{SyncOptions, sync_table};

use anyhow::{Context, Result};
use args::{Args, Command};
use config::{SyncConfig, describe_url, require_url};
use serde::Serialize;
use std::time::Duration;

/// Runs one command to completion. Per-table failures are part of the output, not errors.
pub fn run(args: Args) -> Result<()> {
    let catalog = Catalog::default();
    let output_json = args.output_json;
    match args.command {
        Command::Sync { source, sync } => {
            let source_url = require_url(
                &source,
                "source connection string",
                "--source",
                "SOURCE_DATABASE_URL",
            )?;
            let config = SyncConfig::from_args(&sync, &catalog)?;
            let source = PgConnection::connect("source", &source_url, config.connect_timeout)
                .context("opening the source database")?;
            let destination = connect_destination(&config)?;
            let report = MigrationOrchestrator::new(source, destination, config.plan, config.options)
                .with_labels(describe_url(&source_url), describe_url(&config.destination_url))
                .orchestrate();
            print_report(&report, output_json)
        }
        Command::Import { file, sync } => {
            let config = SyncConfig::from_args(&sync, &catalog)?;
            let snapshot = Snapshot::load(&file).context("loading the snapshot")?;
            log::info!(
                "Loaded {} tables from {}",
                snapshot.table_names().count(),
                file.display()
            );
            let destination = connect_destination(&config)?;
            let report = MigrationOrchestrator::new(snapshot, destination, config.plan, config.options)
                .with_labels(file.display().to_string(), describe_url(&config.destination_url))
                .orchestrate();
            print_report(&report, output_json)
        }
        Command::Export {
            uri,
            output,
            connect_timeout,
            filter,
        } => {
            let url = require_url(&uri, "database connection string", "--uri", "DATABASE_URL")?;
            let plan = config::plan(&catalog, &filter)?;
            let mut connection =
                PgConnection::connect("source", &url, Duration::from_secs(connect_timeout))
                    .context("opening the database")?;
            let snapshot = Snapshot::export(&mut connection, &plan);
            connection.close();
            snapshot
                .save(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            log::info!("Saved export of {} to {}", describe_url(&url), output.display());
            Ok(())
        }
        Command::Template { output } => {
            Snapshot::template(catalog.tables())
                .save(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            log::info!("Created data template at {}", output.display());
            Ok(())
        }
        Command::PullApi { api, sync } => {
            let api_config = AdminApiConfig::from_args(&api)?;
            let config = SyncConfig::from_args(&sync, &catalog)?;
            let admin = AdminApi::login(&api_config, catalog.tables())?;
            let destination = connect_destination(&config)?;
            let report = MigrationOrchestrator::new(admin, destination, config.plan, config.options)
                .with_labels(api_config.base_url.clone(), describe_url(&config.destination_url))
                .orchestrate();
            print_report(&report, output_json)
        }
        Command::CheckApi { api, filter } => {
            let api_config = AdminApiConfig::from_args(&api)?;
            let plan = config::plan(&catalog, &filter)?;
            let admin = AdminApi::login(&api_config, catalog.tables())?;
            print_counts(&endpoint_counts(&admin, &plan), output_json)
        }
        Command::Status {
            uri,
            connect_timeout,
            filter,
        } => {
            let url = require_url(&uri, "database connection string", "--uri", "DATABASE_URL")?;
            let plan = config::plan(&catalog, &filter)?;
            let mut connection =
                PgConnection::connect("database", &url, Duration::from_secs(connect_timeout))
                    .context("opening the database")?;
            log::info!("Counting rows in {}", describe_url(&url));
            let counts: Vec<TableCount> = plan
                .iter()
                .map(|spec| match connection.count_rows(&spec.table()) {
                    Ok(count) => TableCount {
                        table: spec.name.to_string(),
                        count: Some(count),
                        error: None,
                    },
                    Err(err) => {
                        log::error!("{err}");
                        TableCount {
                            table: spec.name.to_string(),
                            count: None,
                            error: Some(err.to_string()),
                        }
                    }
                })
                .collect();
            connection.close();
            print_counts(&counts, output_json)
        }
    }
}

/// Process exit code for a failed [`run`]: 2 for configuration problems, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ConfigError>().is_some() {
        2
    } else {
        1
    }
}

fn connect_destination(config: &SyncConfig) -> Result<PgConnection> {
    PgConnection::connect("destination", &config.destination_url, config.connect_timeout)
        .context("opening the destination database")
}

/// Record count per planned table served by the admin API. An unreachable endpoint is
/// reported as an error, not as zero records.
fn endpoint_counts(admin: &AdminApi, plan: &[TableSpec]) -> Vec<TableCount> {
    plan.iter()
        .filter_map(|spec| {
            let endpoint = spec.admin_endpoint?;
            let count = match admin.try_fetch(endpoint) {
                Ok(rows) => TableCount {
                    table: spec.name.to_string(),
                    count: Some(rows.len() as i64),
                    error: None,
                },
                Err(err) => {
                    log::warn!("{err}");
                    TableCount {
                        table: spec.name.to_string(),
                        count: None,
                        error: Some(err.to_string()),
                    }
                }
            };
            Some(count)
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct TableCount {
    table: String,
    count: Option<i64>,
    error: Option<String>,
}

fn print_report(report: &SyncReport, output_json: bool) -> Result<()> {
    if output_json {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    Ok(())
}

fn print_counts(counts: &[TableCount], output_json: bool) -> Result<()> {
    if output_json {
        println!("{}", serde_json::to_string_pretty(counts)?);
        return Ok(());
    }
    for count in counts {
        match (&count.count, &count.error) {
            (Some(n), _) => println!("{}: {} records", count.table, n),
            (None, Some(err)) => println!("{}: error: {}", count.table, err),
            (None, None) => println!("{}: unknown", count.table),
        }
    }
    Ok(())
}
