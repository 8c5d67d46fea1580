//! Batched, parameterized inserts.

use crate::column_map::ColumnMap;
use crate::error::SyncError;
use crate::normalize::{Row, normalize_row};
use crate::sql_value::SqlValue;
use crate::table::{Table, quote_ident};
use itertools::Itertools;
use postgres::types::ToSql;

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Splits rows into consecutive batches of at most `batch_size` rows, in order.
pub fn batches(rows: &[Row], batch_size: usize) -> impl Iterator<Item = &[Row]> {
    rows.chunks(batch_size.max(1))
}

/// One multi-row `INSERT` with its bound parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertBatch {
    pub table: Table,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl InsertBatch {
    /// Normalizes `rows` and lines them up under the union of their columns, in the order
    /// columns are first seen. A column a row lacks binds NULL.
    pub fn build(table: &Table, rows: &[Row], columns: &ColumnMap) -> Result<Self, SyncError> {
        let normalized: Vec<Vec<(String, SqlValue)>> =
            rows.iter().map(|row| normalize_row(row, columns)).collect();
        if let Some(index) = normalized.iter().position(|row| row.is_empty()) {
            return Err(SyncError::EmptyRow {
                table: table.to_string(),
                index,
            });
        }
        let names: Vec<String> = normalized
            .iter()
            .flat_map(|row| row.iter().map(|(name, _)| name.clone()))
            .unique()
            .collect();
        let rows = normalized
            .into_iter()
            .map(|row| {
                names
                    .iter()
                    .map(|name| {
                        row.iter()
                            .find(|(col, _)| col == name)
                            .map(|(_, value)| value.clone())
                            .unwrap_or(SqlValue::Null)
                    })
                    .collect()
            })
            .collect();
        Ok(InsertBatch {
            table: table.clone(),
            columns: names,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `INSERT INTO "t" ("a", "b") VALUES ($1, $2), ($3, $4)`. Only identifiers are
    /// spliced in; every value is a placeholder.
    pub fn sql(&self) -> String {
        let width = self.columns.len();
        let values = (0..self.rows.len())
            .map(|r| {
                let placeholders = (1..=width).map(|c| format!("${}", r * width + c)).join(", ");
                format!("({placeholders})")
            })
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table.quoted(),
            self.columns.iter().map(|c| quote_ident(c)).join(", "),
            values
        )
    }

    pub fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.rows
            .iter()
            .flatten()
            .map(|value| value as &(dyn ToSql + Sync))
            .collect()
    }
}
