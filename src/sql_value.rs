//! Normalized values bound into destination inserts.

use bytes::BytesMut;
use postgres_types::{Format, IsNull, ToSql, Type, to_sql_checked};
use std::error::Error;

/// A column value ready for parameter binding.
///
/// Values are sent in Postgres text format, so the destination column's own input
/// function does the parsing: `"42"` lands in an `integer`, `"{\"a\"}"` in a `text[]`,
/// `"[1,2]"` in a `jsonb`, an ISO timestamp in a `timestamptz`.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl SqlValue {
    /// The text sent over the wire, `None` for SQL NULL.
    pub fn as_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Bool(b) => Some(b.to_string()),
            SqlValue::Number(n) => Some(n.to_string()),
            SqlValue::Text(s) => Some(s.clone()),
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self, _ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self.as_text() {
            None => Ok(IsNull::Yes),
            Some(text) => {
                out.extend_from_slice(text.as_bytes());
                Ok(IsNull::No)
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    fn encode_format(&self, _ty: &Type) -> Format {
        Format::Text
    }

    to_sql_checked!();
}
