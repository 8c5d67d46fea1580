//! Client for the website's admin HTTP API, usable as a row [`Source`].

use crate::catalog::TableSpec;
use crate::error::SyncError;
use crate::normalize::Row;
use crate::source::Source;
use crate::table::Table;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminApiConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    success: bool,
    token: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct ListResponse {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    message: Option<String>,
}

/// An authenticated session. Every request is timeboxed on its own.
pub struct AdminApi {
    client: Client,
    base_url: String,
    token: String,
    endpoints: Vec<(String, &'static str)>,
}

impl AdminApi {
    /// Logs in. Failure here is fatal for the run.
    pub fn login(config: &AdminApiConfig, tables: &[TableSpec]) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SyncError::Api(e.to_string()))?;
        let base_url = config.base_url.trim_end_matches('/').to_string();
        log::info!("Logging in to {base_url}");
        let response = client
            .post(format!("{base_url}/api/auth/login"))
            .json(&LoginRequest {
                username: &config.username,
                password: &config.password,
            })
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    SyncError::Api("login request timed out, the server may be unreachable".into())
                } else {
                    SyncError::Api(format!("login request failed: {e}"))
                }
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Api(format!("login failed: HTTP {status}")));
        }
        let body = response.text().map_err(|e| SyncError::Api(e.to_string()))?;
        let token = parse_login(&body)?;
        log::info!("Logged in to {base_url}");
        Ok(Self {
            client,
            base_url,
            token,
            endpoints: tables
                .iter()
                .filter_map(|t| t.admin_endpoint.map(|e| (t.name.to_string(), e)))
                .collect(),
        })
    }

    pub fn endpoint(&self, table: &str) -> Option<&'static str> {
        self.endpoints
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, endpoint)| *endpoint)
    }

    /// Rows served at `endpoint`. Timeouts and failures read as empty.
    pub fn fetch(&self, endpoint: &str) -> Vec<Row> {
        log::info!("Fetching {endpoint}");
        match self.try_fetch(endpoint) {
            Ok(rows) => {
                log::info!("Fetched {} records from {endpoint}", rows.len());
                rows
            }
            Err(err) => {
                log::warn!("{err}");
                Vec::new()
            }
        }
    }

    /// Like [`AdminApi::fetch`], but a timeout, an HTTP error or an unsuccessful response
    /// is returned instead of read as empty.
    pub fn try_fetch(&self, endpoint: &str) -> Result<Vec<Row>, SyncError> {
        let response = self
            .client
            .get(format!("{}/api{endpoint}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    SyncError::Api(format!("request to {endpoint} timed out"))
                } else {
                    SyncError::Api(format!("failed to fetch {endpoint}: {e}"))
                }
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Api(format!("failed to fetch {endpoint}: HTTP {status}")));
        }
        let body = response
            .text()
            .map_err(|e| SyncError::Api(format!("failed to read {endpoint}: {e}")))?;
        parse_rows(endpoint, &body)
    }
}

impl Source for AdminApi {
    fn fetch_rows(&mut self, table: &Table) -> Result<Vec<Row>, SyncError> {
        match self.endpoint(&table.name) {
            Some(endpoint) => Ok(self.fetch(endpoint)),
            None => {
                log::info!("{table} is not served by the admin API");
                Ok(Vec::new())
            }
        }
    }
}

fn parse_login(body: &str) -> Result<String, SyncError> {
    let response: LoginResponse = serde_json::from_str(body)
        .map_err(|e| SyncError::Api(format!("unexpected login response: {e}")))?;
    match (response.success, response.token) {
        (true, Some(token)) => Ok(token),
        _ => Err(SyncError::Api(format!(
            "login failed: {}",
            response.message.as_deref().unwrap_or("no token returned")
        ))),
    }
}

fn parse_rows(endpoint: &str, body: &str) -> Result<Vec<Row>, SyncError> {
    let response: ListResponse = serde_json::from_str(body)
        .map_err(|e| SyncError::Api(format!("unexpected response from {endpoint}: {e}")))?;
    if !response.success {
        return Err(SyncError::Api(format!(
            "failed to fetch {endpoint}: {}",
            response.message.as_deref().unwrap_or("unsuccessful response")
        )));
    }
    match response.data {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect()),
        // single-record resources such as the about/footer content
        Some(Value::Object(row)) => Ok(vec![row]),
        Some(other) => Err(SyncError::Api(format!(
            "unexpected data from {endpoint}: {other}"
        ))),
    }
}
