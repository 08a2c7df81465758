//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so handlers can hand
//! them straight back to the caller as JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A stored grid entry. `(tab_id, row_index, col_index)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cell {
    /// Server-assigned row id.
    pub id: i64,
    pub tab_id: i64,
    pub row_index: i64,
    pub col_index: i64,
    pub content: String,
    /// Optional header text, empty when never set.
    #[serde(default)]
    pub header: String,
}

/// The caller-supplied part of a cell, used for upserts and sync-all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewCell {
    pub tab_id: i64,
    pub row_index: i64,
    pub col_index: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub header: String,
}

impl NewCell {
    pub fn new(tab_id: i64, row_index: i64, col_index: i64, content: impl Into<String>) -> Self {
        Self {
            tab_id,
            row_index,
            col_index,
            content: content.into(),
            header: String::new(),
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Column name
// ---------------------------------------------------------------------------

/// Display name of one column in one tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnName {
    pub tab_id: i64,
    pub col_index: i64,
    pub name: String,
}

/// `tab_id -> col_index -> name`. Serializes with string keys.
pub type ColumnNameMap = BTreeMap<i64, BTreeMap<i64, String>>;

/// Group a flat list of column names by tab.
pub fn group_column_names(names: impl IntoIterator<Item = ColumnName>) -> ColumnNameMap {
    let mut map = ColumnNameMap::new();
    for column in names {
        map.entry(column.tab_id)
            .or_default()
            .insert(column.col_index, column.name);
    }
    map
}

/// Flatten a grouped map back into rows.
pub fn flatten_column_names(map: &ColumnNameMap) -> Vec<ColumnName> {
    map.iter()
        .flat_map(|(tab_id, columns)| {
            columns.iter().map(move |(col_index, name)| ColumnName {
                tab_id: *tab_id,
                col_index: *col_index,
                name: name.clone(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// An uploaded image. `file_url` holds the base64 payload itself and is
/// `None` in listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Image {
    pub id: i64,
    pub file_name: String,
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Sync summary
// ---------------------------------------------------------------------------

/// Row counts written by a full sync.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncSummary {
    pub cells_saved: usize,
    pub columns_saved: usize,
}
