//! Rectangular table value type for untrusted revenue-source rows.
//!
//! Providers hand back loosely-typed cells keyed by position; all column
//! access goes through header lookup here so the reconciliation logic never
//! carries raw positional indices.

use serde::{Deserialize, Serialize};

/// One rectangular tab/page of a revenue source: a header row plus data rows.
/// Cells are kept as strings; parsing happens at the validation layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Index of a column by header name, case-insensitive and
    /// whitespace-trimmed.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_ascii_lowercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_ascii_lowercase() == wanted)
    }

    /// Cell at (row, column), empty-string padded for ragged rows.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
