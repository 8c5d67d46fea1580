//! Turns command-line arguments and environment into validated run settings.

use crate::admin_api::AdminApiConfig;
use crate::args::{AdminArgs, SyncArgs, TableFilter};
use crate::catalog::{Catalog, TableSpec};
use crate::error::ConfigError;
use crate::table_sync::SyncOptions;
use postgres::config::Host;
use std::time::Duration;

/// Settings shared by every command that writes into a destination database.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub destination_url: String,
    pub options: SyncOptions,
    pub plan: Vec<TableSpec>,
    pub connect_timeout: Duration,
}

impl SyncConfig {
    pub fn from_args(args: &SyncArgs, catalog: &Catalog) -> Result<Self, ConfigError> {
        let destination_url = require_url(
            &args.destination,
            "destination connection string",
            "--destination",
            "DATABASE_URL",
        )?;
        if args.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(Self {
            destination_url,
            options: SyncOptions {
                batch_size: args.batch_size,
                transactional: !args.no_transaction,
            },
            plan: plan(catalog, &args.filter)?,
            connect_timeout: Duration::from_secs(args.connect_timeout),
        })
    }
}

impl AdminApiConfig {
    pub fn from_args(args: &AdminArgs) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: require(&args.api_url, "admin API URL", "--api-url", "ADMIN_API_URL")?,
            username: require(
                &args.username,
                "admin username",
                "--username",
                "ADMIN_USERNAME",
            )?,
            password: require(
                &args.password,
                "admin password",
                "--password",
                "ADMIN_PASSWORD",
            )?,
            timeout: Duration::from_secs(args.api_timeout),
        })
    }
}

pub fn plan(catalog: &Catalog, filter: &TableFilter) -> Result<Vec<TableSpec>, ConfigError> {
    catalog.plan(&filter.tables)
}

/// An empty value counts as missing.
pub fn require(
    value: &Option<String>,
    setting: &'static str,
    flag: &'static str,
    env: &'static str,
) -> Result<String, ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ConfigError::Missing { setting, flag, env }),
    }
}

/// Like [`require`], and the value must parse as a PostgreSQL connection string.
pub fn require_url(
    value: &Option<String>,
    setting: &'static str,
    flag: &'static str,
    env: &'static str,
) -> Result<String, ConfigError> {
    let url = require(value, setting, flag, env)?;
    url.parse::<postgres::Config>()
        .map_err(|e| ConfigError::InvalidUrl {
            setting,
            message: e.to_string(),
        })?;
    Ok(url)
}

/// `host/dbname` for logs, leaving credentials out.
pub fn describe_url(url: &str) -> String {
    let Ok(config) = url.parse::<postgres::Config>() else {
        return "<invalid connection string>".to_string();
    };
    let host = match config.get_hosts().first() {
        Some(Host::Tcp(host)) => host.clone(),
        #[cfg(unix)]
        Some(Host::Unix(path)) => path.display().to_string(),
        None => "localhost".to_string(),
    };
    format!("{}/{}", host, config.get_dbname().unwrap_or("postgres"))
}
