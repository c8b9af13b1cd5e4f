//! Profilegen - persona browsing profiles from a Hugging Face dataset
//!
//! Downloads the synthetic browsing-profiles dataset, exports the visit
//! table as CSV and aggregates every persona's visits into a per-URL
//! profile JSON.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (download, missing columns, write failure, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod report;

use analysis::ProfileOptions;
use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use loader::{DatasetSource, LoadOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Profilegen v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_pipeline(args).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .profilegen.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", config::CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Edit it to change the dataset, output paths, or profile rules.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the load, export and aggregate steps in order.
async fn run_pipeline(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let source = DatasetSource::from(&config.dataset);
    let mut load_options = LoadOptions::from(&config.dataset);
    load_options.token = args.token.clone();
    load_options.force_refresh = args.force;
    load_options.show_progress = !args.quiet;

    // Step 1: Load the dataset
    println!("📥 Loading dataset from Hugging Face: {}", source);
    let table = loader::load_table(&source, &load_options)
        .await
        .with_context(|| format!("Failed to load dataset {}", source))?;
    println!("   Dataset loaded: {} rows", table.len());
    if table.is_empty() {
        warn!("Dataset {} has no rows; outputs will be empty", source);
    }

    // Step 2: Project and export CSV
    let required = config.output.effective_required_columns();
    report::require_columns(&table, required.as_slice())?;

    let csv_path = PathBuf::from(&config.output.csv_path);
    let projection = report::project(&table, config.output.columns.as_slice());
    if !projection.missing.is_empty() {
        println!("   ⚠️  Columns not in dataset: {}", projection.missing.join(", "));
    }
    report::write_csv(&projection, &csv_path)
        .with_context(|| format!("Failed to write CSV to {}", csv_path.display()))?;
    println!("💾 Saved {} rows to {}", projection.len(), csv_path.display());

    // Step 3: Persona statistics
    let personas = analysis::distinct_categories(&table)?;
    println!("   Unique personas found: {:?}", personas);
    println!("   Persona distribution:");
    for (persona, count) in analysis::category_distribution(&table)? {
        println!("     {:<30} {}", persona, count);
    }

    // Step 4: Build and save profiles
    println!("\n🧮 Generating profiles...");
    let options = ProfileOptions::from(&config.profiles);
    debug!(
        "Profile options: collision={}, timestamp_order={}",
        options.collision, options.timestamp_order
    );
    let store = analysis::build_profiles(&table, &options)?;

    for (persona, urls) in analysis::url_counts(&store) {
        println!("  - {}: {} unique URLs", persona, urls);
    }

    let json_path = PathBuf::from(&config.output.json_path);
    report::write_profiles(&store, &json_path)
        .with_context(|| format!("Failed to write profiles to {}", json_path.display()))?;

    println!("\n✅ Saved all profiles to {}", json_path.display());
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location; a broken file fails the run rather than
    // silently falling back to default profile rules
    match Config::load_default()? {
        Some(config) => {
            info!("Loaded default config from {}", config::CONFIG_FILE);
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
