//! Persona profile aggregation and dataset statistics.
//!
//! Partitions the visit table by persona, groups each persona's visits by
//! URL and summarizes every group into a [`UrlSummary`].

use crate::error::PipelineError;
use crate::models::{
    cell_to_key, cell_to_string, CollisionPolicy, Profile, ProfileStore, Table, TimestampOrder,
    UrlSummary,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Column holding the persona label.
pub const CATEGORY_COLUMN: &str = "persona";
/// Column holding the visited URL.
pub const URL_COLUMN: &str = "url";
/// Column holding the page title.
pub const TITLE_COLUMN: &str = "title";
/// Column holding the visit timestamp.
pub const VISIT_TIME_COLUMN: &str = "visit_time";

/// Options controlling profile aggregation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileOptions {
    pub collision: CollisionPolicy,
    pub timestamp_order: TimestampOrder,
}

impl From<&crate::config::ProfilesConfig> for ProfileOptions {
    fn from(config: &crate::config::ProfilesConfig) -> Self {
        Self {
            collision: config.collision,
            timestamp_order: config.timestamp_order,
        }
    }
}

/// Distinct persona labels, sorted lexicographically.
pub fn distinct_categories(table: &Table) -> Result<Vec<String>, PipelineError> {
    let idx = table.require_column(CATEGORY_COLUMN)?;

    let labels: BTreeSet<String> = table
        .rows
        .iter()
        .filter_map(|row| row.get(idx).and_then(cell_to_key))
        .collect();

    Ok(labels.into_iter().collect())
}

/// Number of rows per persona label, most frequent first.
pub fn category_distribution(table: &Table) -> Result<Vec<(String, usize)>, PipelineError> {
    let idx = table.require_column(CATEGORY_COLUMN)?;

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in &table.rows {
        if let Some(label) = row.get(idx).and_then(cell_to_key) {
            *counts.entry(label).or_default() += 1;
        }
    }

    let mut dist: Vec<_> = counts.into_iter().collect();
    // Stable sort keeps ties in label order
    dist.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    Ok(dist)
}

/// Build the per-persona URL profiles from the full table.
pub fn build_profiles(table: &Table, options: &ProfileOptions) -> Result<ProfileStore, PipelineError> {
    let category_idx = table.require_column(CATEGORY_COLUMN)?;
    let url_idx = table.require_column(URL_COLUMN)?;
    let title_idx = table.column_index(TITLE_COLUMN);
    let time_idx = table.column_index(VISIT_TIME_COLUMN);

    // lower-cased label -> source spellings
    let mut variants: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    // lower-cased label -> url -> row indices in source order
    let mut groups: BTreeMap<String, BTreeMap<String, Vec<usize>>> = BTreeMap::new();

    for (row_idx, row) in table.rows.iter().enumerate() {
        let Some(label) = row.get(category_idx).and_then(cell_to_key) else {
            debug!("Skipping row {} without a persona", row_idx);
            continue;
        };
        let key = label.to_lowercase();
        variants.entry(key.clone()).or_default().insert(label);
        let urls = groups.entry(key).or_default();

        let Some(url) = row.get(url_idx).and_then(cell_to_key) else {
            debug!("Skipping row {} without a url", row_idx);
            continue;
        };
        urls.entry(url).or_default().push(row_idx);
    }

    for (key, spellings) in &variants {
        if spellings.len() < 2 {
            continue;
        }
        let spellings: Vec<String> = spellings.iter().cloned().collect();
        match options.collision {
            CollisionPolicy::Reject => {
                return Err(PipelineError::CategoryCollision {
                    label: key.clone(),
                    variants: spellings,
                });
            }
            CollisionPolicy::Merge => {
                warn!(
                    "Merging persona labels {:?} into '{}'",
                    spellings, key
                );
            }
        }
    }

    let mut store = ProfileStore::new();
    for (key, urls) in groups {
        let mut profile = Profile::new();
        for (url, rows) in urls {
            let latest = latest_row(table, &rows, time_idx, options.timestamp_order);
            let title = title_idx
                .map(|i| cell_to_string(table.cell(latest, i)))
                .unwrap_or_default();
            let last_visit_time = time_idx
                .map(|i| cell_to_string(table.cell(latest, i)))
                .unwrap_or_default();
            profile.insert(url, UrlSummary::new(title, rows.len(), last_visit_time));
        }
        store.insert(key, profile);
    }

    Ok(store)
}

/// Pick the most recent row of a group. Ties keep the earliest row.
fn latest_row(table: &Table, rows: &[usize], time_idx: Option<usize>, order: TimestampOrder) -> usize {
    let Some(time_idx) = time_idx else {
        return rows[0];
    };

    let mut best = rows[0];
    let mut best_time = cell_to_string(table.cell(best, time_idx));
    for &row in &rows[1..] {
        let time = cell_to_string(table.cell(row, time_idx));
        if compare_visit_times(&time, &best_time, order) == Ordering::Greater {
            best = row;
            best_time = time;
        }
    }
    best
}

/// Compare two visit times under the given ordering.
pub fn compare_visit_times(a: &str, b: &str, order: TimestampOrder) -> Ordering {
    match order {
        TimestampOrder::Lexical => a.cmp(b),
        TimestampOrder::Chronological => parse_visit_time(a)
            .cmp(&parse_visit_time(b))
            .then_with(|| a.cmp(b)),
    }
}

/// Parse a visit time in one of the ISO-8601 shapes the dataset uses.
pub fn parse_visit_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Number of distinct URLs per persona.
pub fn url_counts(store: &ProfileStore) -> Vec<(&str, usize)> {
    store
        .iter()
        .map(|(label, profile)| (label.as_str(), profile.len()))
        .collect()
}
