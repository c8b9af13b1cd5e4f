//! Dataset loading.
//!
//! Retrieves the visit dataset from the Hugging Face datasets-server and
//! keeps a local copy so later runs skip the download.

pub mod cache;
pub mod hub;
#[cfg(test)]
pub(crate) mod test_server;

use crate::error::LoadError;
use crate::models::Table;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

pub use hub::HubClient;

/// Dataset identifier of the synthetic browsing profiles.
pub const DEFAULT_DATASET_ID: &str = "zijuncheng/synthetic_profiles_ver_1";
/// Dataset config name.
pub const DEFAULT_DATASET_CONFIG: &str = "default";
/// Dataset split.
pub const DEFAULT_SPLIT: &str = "train";
/// Public datasets-server endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://datasets-server.huggingface.co";

/// Identifies one split of a remote dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSource {
    pub id: String,
    pub config: String,
    pub split: String,
}

impl Default for DatasetSource {
    fn default() -> Self {
        Self {
            id: DEFAULT_DATASET_ID.to_string(),
            config: DEFAULT_DATASET_CONFIG.to_string(),
            split: DEFAULT_SPLIT.to_string(),
        }
    }
}

impl From<&crate::config::DatasetConfig> for DatasetSource {
    fn from(config: &crate::config::DatasetConfig) -> Self {
        Self {
            id: config.id.clone(),
            config: config.config.clone(),
            split: config.split.clone(),
        }
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}/{}]", self.id, self.config, self.split)
    }
}

/// Options for loading a dataset.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// datasets-server base URL.
    pub endpoint: String,
    /// Rows requested per page.
    pub page_size: usize,
    /// HTTP timeout per request.
    pub timeout_seconds: u64,
    /// Bearer token for gated or private datasets.
    pub token: Option<String>,
    /// Directory holding cached tables.
    pub cache_dir: PathBuf,
    /// Ignore any cached table and download again.
    pub force_refresh: bool,
    /// Whether to show a progress bar.
    pub show_progress: bool,
}

impl From<&crate::config::DatasetConfig> for LoadOptions {
    fn from(config: &crate::config::DatasetConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            page_size: config.page_size,
            timeout_seconds: config.timeout_seconds,
            token: None,
            cache_dir: PathBuf::from(&config.cache_dir),
            force_refresh: false,
            show_progress: true,
        }
    }
}

/// Load the dataset, preferring the local cache unless a refresh is forced.
pub async fn load_table(source: &DatasetSource, options: &LoadOptions) -> Result<Table, LoadError> {
    let path = cache::cache_path(&options.cache_dir, source);

    if options.force_refresh {
        info!("Force refresh requested, ignoring cache");
    } else {
        match cache::read_cached(&path) {
            Ok(Some(table)) => {
                info!("Loaded {} rows from cache {}", table.len(), path.display());
                return Ok(table);
            }
            Ok(None) => {}
            Err(e) => warn!("Ignoring unreadable cache: {}", e),
        }
    }

    let client = HubClient::new(
        &options.endpoint,
        options.timeout_seconds,
        options.token.clone(),
        options.page_size,
    )?;
    let table = client.fetch_table(source, options.show_progress).await?;

    if let Err(e) = cache::write_cached(&path, &table) {
        warn!("Failed to cache dataset: {}", e);
    }

    Ok(table)
}
