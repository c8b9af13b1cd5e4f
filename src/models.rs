//! Data models for the profile generator.
//!
//! This module contains the in-memory table loaded from the dataset
//! server and the aggregated profile structures written to JSON.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Number of visits at which a URL counts as bookmarked.
pub const BOOKMARK_THRESHOLD: usize = 3;

/// A single row of the dataset, one cell per table column.
pub type Record = Vec<Value>;

/// Tabular dataset with a uniform, ordered schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column names in source schema order.
    pub columns: Vec<String>,
    /// Rows in source order. Every row has `columns.len()` cells.
    pub rows: Vec<Record>,
}

impl Table {
    /// Creates an empty table with the given schema.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row given as a JSON object, aligning cells to the schema.
    ///
    /// Keys not in the schema are ignored; absent keys become null.
    pub fn push_object(&mut self, object: &serde_json::Map<String, Value>) {
        let row = self
            .columns
            .iter()
            .map(|name| object.get(name).cloned().unwrap_or(Value::Null))
            .collect();
        self.rows.push(row);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column in the schema.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Position of a column, failing if the schema lacks it.
    pub fn require_column(&self, name: &str) -> Result<usize, PipelineError> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumns(vec![name.to_string()]))
    }

    /// Returns the cell at `column` in `row`, or null when out of range.
    pub fn cell(&self, row: usize, column: usize) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&Value::Null)
    }
}

/// Render a cell as text for CSV output and profile fields.
///
/// Null renders empty, booleans as `True`/`False`, nested values as compact JSON.
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Like [`cell_to_string`], but `None` for null cells.
pub fn cell_to_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(cell_to_string(other)),
    }
}

/// Aggregated visit statistics for one URL within one persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlSummary {
    /// Title of the most recent visit.
    pub title: String,
    /// Number of visits recorded for this URL.
    pub visits: usize,
    /// True once `visits` reaches [`BOOKMARK_THRESHOLD`].
    pub bookmarked: bool,
    /// Visit time of the most recent visit.
    pub last_visit_time: String,
}

impl UrlSummary {
    pub fn new(title: String, visits: usize, last_visit_time: String) -> Self {
        Self {
            title,
            visits,
            bookmarked: visits >= BOOKMARK_THRESHOLD,
            last_visit_time,
        }
    }
}

/// URL -> summary for one persona.
pub type Profile = BTreeMap<String, UrlSummary>;

/// Lower-cased persona label -> profile.
pub type ProfileStore = BTreeMap<String, Profile>;

/// How to treat source labels that collide once lower-cased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Pool the records of all colliding labels into one profile.
    #[default]
    Merge,
    /// Abort the run.
    Reject,
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionPolicy::Merge => write!(f, "merge"),
            CollisionPolicy::Reject => write!(f, "reject"),
        }
    }
}

/// How visit times are compared when picking the latest visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampOrder {
    /// Compare the raw strings.
    #[default]
    Lexical,
    /// Parse as calendar time; unparseable values sort oldest.
    Chronological,
}

impl fmt::Display for TimestampOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampOrder::Lexical => write!(f, "lexical"),
            TimestampOrder::Chronological => write!(f, "chronological"),
        }
    }
}
