use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Equality filter on a single row column, rendered on the wire as
/// `column=eq.value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub value: String,
}

impl RowFilter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Tri-state match against one row: `None` when the row does not carry
    /// the column at all.
    pub fn matches_row(&self, row: &Map<String, JsonValue>) -> Option<bool> {
        row.get(&self.column).map(|v| column_equals(v, &self.value))
    }
}

/// Compares a JSON cell against a textual id. Numeric ids compare by their
/// decimal rendering so `42` matches `"42"`.
pub(crate) fn column_equals(cell: &JsonValue, expected: &str) -> bool {
    match cell {
        JsonValue::String(s) => s == expected,
        JsonValue::Number(n) => n.to_string() == expected,
        _ => false,
    }
}

impl fmt::Display for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=eq.{}", self.column, self.value)
    }
}
