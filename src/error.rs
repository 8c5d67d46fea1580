//! Error types for the sync library.

use thiserror::Error;

/// Fatal configuration problems. Raised before any table is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting was neither passed on the command line nor set in the environment.
    #[error("missing {setting}: pass {flag} or set {env}")]
    Missing {
        setting: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("table '{table}' depends on unknown table '{dependency}'")]
    UnknownDependency { table: String, dependency: String },

    #[error("dependency cycle between tables: {0}")]
    Cycle(String),

    #[error("invalid {setting}: {message}")]
    InvalidUrl {
        setting: &'static str,
        message: String,
    },
}

/// Failures of a single sync step. Below the orchestrator these are logged and folded into
/// a [`crate::TableOutcome`], never propagated.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("connection to {role} failed: {message}")]
    Connect { role: &'static str, message: String },

    #[error("failed to fetch rows from {table}: {message}")]
    Fetch { table: String, message: String },

    #[error("failed to clear {table}: {message}")]
    Delete { table: String, message: String },

    #[error("failed to insert into {table}: {message}")]
    Insert { table: String, message: String },

    #[error("failed to commit {table}: {message}")]
    Commit { table: String, message: String },

    #[error("failed to reset sequences of {table}: {message}")]
    Sequence { table: String, message: String },

    #[error("row {index} of {table} has no columns")]
    EmptyRow { table: String, index: usize },

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("admin API error: {0}")]
    Api(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    pub fn fetch(table: impl ToString, err: impl ToString) -> Self {
        SyncError::Fetch {
            table: table.to_string(),
            message: err.to_string(),
        }
    }

    pub fn delete(table: impl ToString, err: impl ToString) -> Self {
        SyncError::Delete {
            table: table.to_string(),
            message: err.to_string(),
        }
    }

    pub fn insert(table: impl ToString, err: impl ToString) -> Self {
        SyncError::Insert {
            table: table.to_string(),
            message: err.to_string(),
        }
    }

    pub fn commit(table: impl ToString, err: impl ToString) -> Self {
        SyncError::Commit {
            table: table.to_string(),
            message: err.to_string(),
        }
    }

    pub fn sequence(table: impl ToString, err: impl ToString) -> Self {
        SyncError::Sequence {
            table: table.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
