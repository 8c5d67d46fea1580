use crate::table::ColumnInfo;
use serde::Serialize;

/// How a column's values are encoded before being bound into an insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnEncoding {
    /// Scalars pass through; objects and sequences become JSON text.
    Plain,
    /// Every value becomes JSON text, strings included (`json` / `jsonb` columns).
    Json,
    /// Sequences become a Postgres array literal with every element quoted.
    PostgresArray,
}

impl ColumnEncoding {
    /// Picks an encoding from an `information_schema.columns.data_type` value.
    pub fn from_data_type(data_type: &str) -> Self {
        match data_type {
            "ARRAY" => ColumnEncoding::PostgresArray,
            "json" | "jsonb" => ColumnEncoding::Json,
            _ => ColumnEncoding::Plain,
        }
    }
}

/// Maps columns of one table to their encoding. Columns not listed are `Plain`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnMap(Vec<(String, ColumnEncoding)>);

impl ColumnMap {
    /// Builds a map from the encodings declared for a table.
    pub fn declared(columns: &[(&str, ColumnEncoding)]) -> Self {
        ColumnMap(
            columns
                .iter()
                .map(|(name, encoding)| (name.to_string(), *encoding))
                .collect(),
        )
    }

    /// Adds encodings inferred from destination column types. Declared encodings win.
    pub fn with_introspected(mut self, columns: &[ColumnInfo]) -> Self {
        for column in columns {
            if self.0.iter().any(|(name, _)| *name == column.name) {
                continue;
            }
            let encoding = ColumnEncoding::from_data_type(&column.data_type);
            if encoding != ColumnEncoding::Plain {
                self.0.push((column.name.clone(), encoding));
            }
        }
        self
    }

    pub fn encoding(&self, column: &str) -> ColumnEncoding {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, encoding)| *encoding)
            .unwrap_or(ColumnEncoding::Plain)
    }
}
