//! Column projection and CSV export.
//!
//! Keeps the subset of desired columns the dataset actually has and
//! writes it out one row per record.

use crate::error::PipelineError;
use crate::models::{cell_to_string, Table};
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns exported to CSV, in preference order.
pub const DEFAULT_COLUMNS: &[&str] = &[
    "persona",
    "visit_id",
    "visit_time",
    "visit_description",
    "place_id",
    "url",
    "title",
    "domain",
    "visit_count",
    "interest",
    "title_name",
];

/// A view of a table restricted to a subset of its columns.
#[derive(Debug)]
pub struct Projection<'a> {
    table: &'a Table,
    indices: Vec<usize>,
    /// Retained column names, in the table's schema order.
    pub columns: Vec<String>,
    /// Desired columns the table does not have.
    pub missing: Vec<String>,
}

impl Projection<'_> {
    /// Number of rows in the projection.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Iterate over projected rows as text cells.
    pub fn rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.table.rows.iter().map(move |row| {
            self.indices
                .iter()
                .map(|&i| row.get(i).map(cell_to_string).unwrap_or_default())
                .collect()
        })
    }
}

/// Project a table onto the desired columns.
///
/// Retained columns follow the table's schema order; absent ones are
/// recorded in [`Projection::missing`] and logged.
pub fn project<'a, S: AsRef<str>>(table: &'a Table, desired: &[S]) -> Projection<'a> {
    let wanted = |name: &str| desired.iter().any(|d| d.as_ref() == name);

    let (indices, columns): (Vec<usize>, Vec<String>) = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| wanted(name.as_str()))
        .map(|(i, name)| (i, name.clone()))
        .unzip();

    let missing: Vec<String> = desired
        .iter()
        .map(|d| d.as_ref())
        .filter(|d| table.column_index(d).is_none())
        .map(String::from)
        .collect();

    if !missing.is_empty() {
        warn!("Dataset is missing columns: {}", missing.join(", "));
    }
    debug!("Projected columns: {:?}", columns);

    Projection {
        table,
        indices,
        columns,
        missing,
    }
}

/// Fail unless every required column is in the table's schema.
pub fn require_columns<S: AsRef<str>>(table: &Table, required: &[S]) -> Result<(), PipelineError> {
    let missing: Vec<String> = required
        .iter()
        .map(|r| r.as_ref())
        .filter(|r| table.column_index(r).is_none())
        .map(String::from)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingColumns(missing))
    }
}

/// Write a projection to a CSV file, replacing any existing file.
pub fn write_csv(projection: &Projection<'_>, path: &Path) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(&projection.columns)?;
    for row in projection.rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;

    info!(
        "Wrote {} rows x {} columns to {}",
        projection.len(),
        projection.columns.len(),
        path.display()
    );
    Ok(())
}
