//! Row value normalization: turns fetched JSON rows into bindable values.

use crate::column_map::{ColumnEncoding, ColumnMap};
use crate::sql_value::SqlValue;
use itertools::Itertools;
use serde_json::Value;

/// One fetched record, column name to value, in source column order.
pub type Row = serde_json::Map<String, Value>;

/// The literal Postgres reads as an empty array.
pub const EMPTY_ARRAY_LITERAL: &str = "{}";

/// Normalizes every column of `row` using the table's column encodings.
pub fn normalize_row(row: &Row, columns: &ColumnMap) -> Vec<(String, SqlValue)> {
    row.iter()
        .map(|(name, value)| (name.clone(), normalize_value(value, columns.encoding(name))))
        .collect()
}

/// Normalizes one value. Never fails; a value the destination rejects surfaces as an
/// insert error.
pub fn normalize_value(value: &Value, encoding: ColumnEncoding) -> SqlValue {
    match (value, encoding) {
        (Value::Null, _) => SqlValue::Null,
        (Value::Array(items), ColumnEncoding::PostgresArray) => SqlValue::Text(array_literal(items)),
        (value, ColumnEncoding::Json) => SqlValue::Text(value.to_string()),
        (Value::Array(_) | Value::Object(_), _) => SqlValue::Text(value.to_string()),
        (Value::Bool(b), _) => SqlValue::Bool(*b),
        (Value::Number(n), _) => SqlValue::Number(n.clone()),
        (Value::String(s), _) => SqlValue::Text(s.clone()),
    }
}

/// Builds a Postgres array literal with every element double-quoted, so commas, braces
/// and spaces inside elements cannot break the array syntax.
pub fn array_literal(items: &[Value]) -> String {
    if items.is_empty() {
        return EMPTY_ARRAY_LITERAL.to_string();
    }
    let elements = items
        .iter()
        .map(|item| match item {
            Value::Null => "NULL".to_string(),
            Value::String(s) => quote_element(s),
            other => quote_element(&other.to_string()),
        })
        .join(",");
    format!("{{{elements}}}")
}

fn quote_element(element: &str) -> String {
    format!("\"{}\"", element.replace('\\', "\\\\").replace('"', "\\\""))
}
