//! JSON snapshot files: `{ "table": [row, ...], ... }`.
//!
//! A snapshot is what `export` writes and what `import` reads back as a [`Source`], so a
//! database can be moved by hand when the two sides cannot reach each other.

use crate::catalog::TableSpec;
use crate::error::SyncError;
use crate::normalize::Row;
use crate::source::Source;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Tables a hand-filled template leaves out.
const TEMPLATE_EXCLUDED: &[&str] = &["users"];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(serde_json::Map<String, Value>);

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let text = fs::read_to_string(path)
            .map_err(|e| SyncError::Snapshot(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| SyncError::Snapshot(format!("cannot parse {}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> Result<(), SyncError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// An empty list for every table, ready to be filled in by hand.
    pub fn template(tables: &[TableSpec]) -> Self {
        let mut snapshot = Snapshot::default();
        for spec in tables
            .iter()
            .filter(|t| !TEMPLATE_EXCLUDED.contains(&t.name))
        {
            snapshot.insert(spec.name, Vec::new());
        }
        snapshot
    }

    /// Reads every planned table from `source`. A table that cannot be read is logged and
    /// written as an empty list.
    pub fn export<S: Source + ?Sized>(source: &mut S, plan: &[TableSpec]) -> Self {
        let mut snapshot = Snapshot::default();
        for spec in plan {
            let rows = match source.fetch_rows(&spec.table()) {
                Ok(rows) => {
                    log::info!("Exported {} rows from {}", rows.len(), spec.name);
                    rows
                }
                Err(err) => {
                    log::error!("{err}");
                    Vec::new()
                }
            };
            snapshot.insert(spec.name, rows);
        }
        snapshot
    }

    pub fn insert(&mut self, table: &str, rows: Vec<Row>) {
        let rows = rows.into_iter().map(Value::Object).collect();
        self.0.insert(table.to_string(), Value::Array(rows));
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.0
            .get(table)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }
}

impl Source for Snapshot {
    /// A table absent from the file reads as empty.
    fn fetch_rows(&mut self, table: &Table) -> Result<Vec<Row>, SyncError> {
        let Some(value) = self.0.get(&table.name) else {
            return Ok(Vec::new());
        };
        let Value::Array(items) = value else {
            return Err(SyncError::fetch(table, "snapshot entry is not a list"));
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(row) => Ok(row.clone()),
                _ => Err(SyncError::fetch(table, format!("snapshot row {i} is not an object"))),
            })
            .collect()
    }
}
