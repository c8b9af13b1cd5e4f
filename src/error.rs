//! Error types for loading and processing the dataset.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while retrieving the dataset or reading the local cache.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to retrieve {url}: {message}")]
    Retrieval { url: String, message: String },

    #[error("dataset server returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode dataset response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("server at {url} stopped after {fetched} of {total} rows")]
    Incomplete {
        url: String,
        fetched: usize,
        total: usize,
    },

    #[error("cache error at {}: {source}", .path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cached table at {} is corrupt: {source}", .path.display())]
    CorruptCache {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while projecting, aggregating or writing outputs.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("required columns missing from dataset: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("category label '{label}' collides across source labels: {}", .variants.join(", "))]
    CategoryCollision { label: String, variants: Vec<String> },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let err = PipelineError::MissingColumns(vec!["persona".to_string(), "url".to_string()]);
        assert_eq!(
            err.to_string(),
            "required columns missing from dataset: persona, url"
        );
    }

    #[test]
    fn test_collision_message() {
        let err = PipelineError::CategoryCollision {
            label: "teacher".to_string(),
            variants: vec!["Teacher".to_string(), "teacher".to_string()],
        };
        assert!(err.to_string().contains("Teacher, teacher"));
    }
}
