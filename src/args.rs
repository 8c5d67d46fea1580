use crate::insert::DEFAULT_BATCH_SIZE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Print the result as JSON on stdout
    #[arg(long, global = true)]
    pub output_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct TableFilter {
    /// Only these tables (repeatable); dependency order is kept
    #[arg(short, long = "table", value_name = "TABLE")]
    pub tables: Vec<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SyncArgs {
    /// Destination PostgreSQL connection URI
    #[arg(short, long, env = "DATABASE_URL", hide_env_values = true)]
    pub destination: Option<String>,

    /// Rows per INSERT statement
    #[arg(short, long, env = "SYNC_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Do not wrap each table's delete and inserts in a transaction
    #[arg(long, default_value = "false")]
    pub no_transaction: bool,

    /// Seconds to wait for a database connection
    #[arg(long, env = "SYNC_CONNECT_TIMEOUT_SECS", default_value_t = 30)]
    pub connect_timeout: u64,

    #[command(flatten)]
    pub filter: TableFilter,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AdminArgs {
    /// Base URL of the website serving the admin API
    #[arg(long, env = "ADMIN_API_URL")]
    pub api_url: Option<String>,

    /// Admin username
    #[arg(long, env = "ADMIN_USERNAME")]
    pub username: Option<String>,

    /// Admin password
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Seconds before a single API request is abandoned
    #[arg(long, env = "ADMIN_API_TIMEOUT_SECS", default_value_t = 30)]
    pub api_timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace the destination's content tables with the source's rows
    Sync {
        /// Source PostgreSQL connection URI
        #[arg(short, long, env = "SOURCE_DATABASE_URL", hide_env_values = true)]
        source: Option<String>,

        #[command(flatten)]
        sync: SyncArgs,
    },
    /// Replace the destination's content tables with the rows of a JSON snapshot
    Import {
        /// Snapshot file written by `export` or filled in from `template`
        file: PathBuf,

        #[command(flatten)]
        sync: SyncArgs,
    },
    /// Write every content table of a database to a JSON snapshot
    Export {
        /// PostgreSQL connection URI
        #[arg(short, long, env = "DATABASE_URL", hide_env_values = true)]
        uri: Option<String>,

        /// Snapshot file to write
        #[arg(short, long, default_value = "database-export.json")]
        output: PathBuf,

        /// Seconds to wait for a database connection
        #[arg(long, env = "SYNC_CONNECT_TIMEOUT_SECS", default_value_t = 30)]
        connect_timeout: u64,

        #[command(flatten)]
        filter: TableFilter,
    },
    /// Write an empty snapshot to fill in by hand
    Template {
        /// Template file to write
        #[arg(short, long, default_value = "data-template.json")]
        output: PathBuf,
    },
    /// Replace the destination's content tables with what the admin API serves
    PullApi {
        #[command(flatten)]
        api: AdminArgs,

        #[command(flatten)]
        sync: SyncArgs,
    },
    /// Log in to the admin API and report how many records each resource serves
    CheckApi {
        #[command(flatten)]
        api: AdminArgs,

        #[command(flatten)]
        filter: TableFilter,
    },
    /// Report the row count of every content table
    Status {
        /// PostgreSQL connection URI
        #[arg(short, long, env = "DATABASE_URL", hide_env_values = true)]
        uri: Option<String>,

        /// Seconds to wait for a database connection
        #[arg(long, env = "SYNC_CONNECT_TIMEOUT_SECS", default_value_t = 30)]
        connect_timeout: u64,

        #[command(flatten)]
        filter: TableFilter,
    },
}

pub fn get_args() -> Result<Args, clap::Error> {
    Args::try_parse()
}
