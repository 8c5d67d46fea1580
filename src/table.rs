// src/table.rs
// Table identifiers and destination column introspection.

use postgres::GenericClient;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Table {
    pub schema: Option<String>,
    pub name: String,
}

impl FromStr for Table {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((schema, name)) = s.split_once('.') {
            Ok(Table {
                schema: Some(schema.to_string()),
                name: name.to_string(),
            })
        } else {
            Ok(Table {
                schema: None,
                name: s.to_string(),
            })
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A destination column as reported by `information_schema.columns`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

impl Table {
    pub fn new(full_name: &str) -> Self {
        let Ok(table) = full_name.parse::<Table>();
        table
    }

    /// The table as a double-quoted SQL identifier, safe to splice into statements.
    pub fn quoted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(&self.name)),
            None => quote_ident(&self.name),
        }
    }

    pub fn get_columns<C: GenericClient>(
        &self,
        client: &mut C,
    ) -> Result<Vec<ColumnInfo>, postgres::Error> {
        let rows = client.query(
            "SELECT column_name, data_type FROM information_schema.columns WHERE table_schema = $1 AND table_name = $2 ORDER BY ordinal_position",
            &[&self.schema.as_deref().unwrap_or("public"), &self.name],
        )?;
        Ok(rows
            .iter()
            .map(|row| ColumnInfo {
                name: row.get("column_name"),
                data_type: row.get("data_type"),
            })
            .collect())
    }
}

/// Quotes an identifier for Postgres, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
