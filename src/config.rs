//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.profilegen.toml` files.

use crate::loader::{DEFAULT_DATASET_CONFIG, DEFAULT_DATASET_ID, DEFAULT_ENDPOINT, DEFAULT_SPLIT};
use crate::models::{CollisionPolicy, TimestampOrder};
use crate::report::DEFAULT_COLUMNS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name.
pub const CONFIG_FILE: &str = ".profilegen.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Dataset source and download settings.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Output file settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Profile aggregation settings.
    #[serde(default)]
    pub profiles: ProfilesConfig,
}

/// Remote dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Dataset identifier on the hub.
    #[serde(default = "default_dataset_id")]
    pub id: String,

    /// Dataset config name.
    #[serde(default = "default_dataset_config")]
    pub config: String,

    /// Split to load.
    #[serde(default = "default_split")]
    pub split: String,

    /// datasets-server base URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Rows per request (1-100).
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Directory for the downloaded-table cache.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            id: default_dataset_id(),
            config: default_dataset_config(),
            split: default_split(),
            endpoint: default_endpoint(),
            page_size: default_page_size(),
            timeout_seconds: default_timeout(),
            cache_dir: default_cache_dir(),
        }
    }
}

fn default_dataset_id() -> String {
    DEFAULT_DATASET_ID.to_string()
}

fn default_dataset_config() -> String {
    DEFAULT_DATASET_CONFIG.to_string()
}

fn default_split() -> String {
    DEFAULT_SPLIT.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_timeout() -> u64 {
    60
}

fn default_cache_dir() -> String {
    ".cache/profilegen".to_string()
}

/// Output file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// CSV export path.
    #[serde(default = "default_csv_path")]
    pub csv_path: String,

    /// Profiles JSON path.
    #[serde(default = "default_json_path")]
    pub json_path: String,

    /// Columns to keep in the CSV export.
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,

    /// Columns that must exist in the dataset.
    #[serde(default = "default_required_columns")]
    pub required_columns: Vec<String>,

    /// Require every export column instead of dropping missing ones.
    #[serde(default)]
    pub strict_columns: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            json_path: default_json_path(),
            columns: default_columns(),
            required_columns: default_required_columns(),
            strict_columns: false,
        }
    }
}

fn default_csv_path() -> String {
    "public/synthetic_profiles.csv".to_string()
}

fn default_json_path() -> String {
    "public/profiles.json".to_string()
}

fn default_columns() -> Vec<String> {
    DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect()
}

fn default_required_columns() -> Vec<String> {
    vec!["persona".to_string(), "url".to_string()]
}

/// Profile aggregation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilesConfig {
    /// What to do when persona labels differ only by case.
    #[serde(default)]
    pub collision: CollisionPolicy,

    /// How visit times are ordered when picking the latest visit.
    #[serde(default)]
    pub timestamp_order: TimestampOrder,
}

impl OutputConfig {
    /// Columns that must be present before anything is written.
    pub fn effective_required_columns(&self) -> Vec<String> {
        if self.strict_columns {
            let mut required = self.columns.clone();
            for column in &self.required_columns {
                if !required.contains(column) {
                    required.push(column.clone());
                }
            }
            required
        } else {
            self.required_columns.clone()
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.profilegen.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref path) = args.csv_output {
            self.output.csv_path = path.display().to_string();
        }
        if let Some(ref path) = args.json_output {
            self.output.json_path = path.display().to_string();
        }
        if let Some(ref dir) = args.cache_dir {
            self.dataset.cache_dir = dir.display().to_string();
        }

        // Flags always override
        if args.strict_columns {
            self.output.strict_columns = true;
        }
    }

    /// Validate settings that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if !(1..=crate::loader::hub::MAX_PAGE_SIZE).contains(&self.dataset.page_size) {
            anyhow::bail!(
                "dataset.page_size must be between 1 and {}",
                crate::loader::hub::MAX_PAGE_SIZE
            );
        }
        if self.dataset.timeout_seconds == 0 {
            anyhow::bail!("dataset.timeout_seconds must be at least 1");
        }
        if self.output.csv_path == self.output.json_path {
            anyhow::bail!("CSV and JSON outputs must be different files");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.dataset.id, "zijuncheng/synthetic_profiles_ver_1");
        assert_eq!(config.dataset.split, "train");
        assert_eq!(config.output.csv_path, "public/synthetic_profiles.csv");
        assert_eq!(config.output.json_path, "public/profiles.json");
        assert_eq!(config.output.columns.len(), 11);
        assert_eq!(config.profiles.collision, CollisionPolicy::Merge);
        assert_eq!(config.profiles.timestamp_order, TimestampOrder::Lexical);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[dataset]
split = "test"
page_size = 50

[output]
json_path = "out/profiles.json"
strict_columns = true

[profiles]
collision = "reject"
timestamp_order = "chronological"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.dataset.split, "test");
        assert_eq!(config.dataset.id, "zijuncheng/synthetic_profiles_ver_1");
        assert_eq!(config.dataset.page_size, 50);
        assert_eq!(config.output.json_path, "out/profiles.json");
        assert!(config.output.strict_columns);
        assert_eq!(config.profiles.collision, CollisionPolicy::Reject);
        assert_eq!(config.profiles.timestamp_order, TimestampOrder::Chronological);
    }

    #[test]
    fn test_load_from_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        assert!(Config::load_from_dir(temp_dir.path()).unwrap().is_none());

        std::fs::write(
            temp_dir.path().join(CONFIG_FILE),
            "[profiles]\ncollision = \"reject\"\n",
        )
        .unwrap();
        let config = Config::load_from_dir(temp_dir.path()).unwrap().unwrap();
        assert_eq!(config.profiles.collision, CollisionPolicy::Reject);
    }

    #[test]
    fn test_load_from_dir_rejects_unknown_policy() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE),
            "[profiles]\ncollision = \"rejct\"\n",
        )
        .unwrap();

        let err = Config::load_from_dir(temp_dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.dataset.page_size = 500;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.json_path = config.output.csv_path.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_effective_required_columns() {
        let mut output = OutputConfig::default();
        assert_eq!(output.effective_required_columns(), vec!["persona", "url"]);

        output.strict_columns = true;
        assert_eq!(output.effective_required_columns(), output.columns);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[dataset]"));
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("[profiles]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.output.columns, Config::default().output.columns);
    }
}
