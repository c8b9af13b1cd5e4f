//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::fmt;
use std::path::PathBuf;

/// Profilegen - persona browsing profiles from the synthetic profiles dataset
///
/// Downloads the dataset from Hugging Face, exports it as CSV and
/// aggregates each persona's visits into a per-URL profile JSON.
///
/// Examples:
///   profilegen
///   profilegen --force
///   profilegen --json-output out/profiles.json --strict-columns
///   profilegen --init-config
#[derive(Parser, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Ignore the local dataset cache and download again
    #[arg(short, long)]
    pub force: bool,

    /// Output path for the CSV export
    ///
    /// Default: from config or public/synthetic_profiles.csv
    #[arg(long, value_name = "FILE")]
    pub csv_output: Option<PathBuf>,

    /// Output path for the profiles JSON
    ///
    /// Default: from config or public/profiles.json
    #[arg(long, value_name = "FILE")]
    pub json_output: Option<PathBuf>,

    /// Directory for the downloaded-dataset cache
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Hugging Face access token for gated datasets
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .profilegen.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Fail if any export column is missing from the dataset
    #[arg(long)]
    pub strict_columns: bool,

    /// Generate a default .profilegen.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("force", &self.force)
            .field("csv_output", &self.csv_output)
            .field("json_output", &self.json_output)
            .field("cache_dir", &self.cache_dir)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("config", &self.config)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .field("strict_columns", &self.strict_columns)
            .field("init_config", &self.init_config)
            .finish()
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let (Some(csv), Some(json)) = (&self.csv_output, &self.json_output) {
            if csv == json {
                return Err("--csv-output and --json-output must be different files".to_string());
            }
        }

        if let Some(ref config_path) = self.config {
            if !config_path.is_file() {
                return Err(format!(
                    "Config file does not exist: {}",
                    config_path.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
