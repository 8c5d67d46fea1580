use crate::error::SyncError;
use crate::table::Table;
use postgres::Client;
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::{PostgresConnectionManager, postgres::NoTls as R2d2NoTls};
use std::time::Duration;

pub type PgPool = Pool<PostgresConnectionManager<R2d2NoTls>>;
pub type PgClient = PooledConnection<PostgresConnectionManager<R2d2NoTls>>;

/// A live database handle for one side of a sync.
///
/// Released exactly once: either through [`PgConnection::close`] or, on any other exit
/// path, when dropped.
pub struct PgConnection {
    pub role: &'static str,
    client: Option<PgClient>,
    pool: Option<PgPool>,
    pub(crate) in_transaction: bool,
}

impl PgConnection {
    pub fn connect(role: &'static str, uri: &str, timeout: Duration) -> Result<Self, SyncError> {
        let connect_err = |message: String| SyncError::Connect { role, message };
        let config = uri
            .parse::<postgres::Config>()
            .map_err(|e| connect_err(e.to_string()))?;
        let manager = PostgresConnectionManager::new(config, R2d2NoTls);
        let pool = Pool::builder()
            .max_size(1)
            .connection_timeout(timeout)
            .build(manager)
            .map_err(|e| connect_err(e.to_string()))?;
        Self::from_pool(role, pool)
    }

    pub fn from_pool(role: &'static str, pool: PgPool) -> Result<Self, SyncError> {
        let client = pool.get().map_err(|e| SyncError::Connect {
            role,
            message: e.to_string(),
        })?;
        log::info!("Connected to {role} database");
        Ok(Self {
            role,
            client: Some(client),
            pool: Some(pool),
            in_transaction: false,
        })
    }

    pub fn client(&mut self) -> Result<&mut Client, SyncError> {
        let role = self.role;
        self.client
            .as_deref_mut()
            .ok_or_else(|| SyncError::Connect {
                role,
                message: "connection already closed".to_string(),
            })
    }

    pub fn is_open(&self) -> bool {
        self.client.is_some()
    }

    pub fn count_rows(&mut self, table: &Table) -> Result<i64, SyncError> {
        let query = format!("SELECT COUNT(*) FROM {}", table.quoted());
        let row = self
            .client()?
            .query_one(&query, &[])
            .map_err(|e| SyncError::fetch(table, e))?;
        Ok(row.get(0))
    }

    /// Returns the connection to its pool and drops the pool. Later calls do nothing.
    pub fn close(&mut self) {
        if let Some(client) = self.client.take() {
            drop(client);
            self.pool.take();
            self.in_transaction = false;
            log::info!("Closed {} database connection", self.role);
        }
    }
}

impl Drop for PgConnection {
    fn drop(&mut self) {
        self.close();
    }
}
