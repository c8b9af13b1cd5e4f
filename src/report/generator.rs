//! Profile JSON generation.
//!
//! Serializes the persona profile store as 2-space indented JSON.

use crate::error::PipelineError;
use crate::models::ProfileStore;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Generate the profiles JSON document.
pub fn generate_profiles_json(store: &ProfileStore) -> Result<String, PipelineError> {
    serde_json::to_string_pretty(store).map_err(Into::into)
}

/// Write the profiles JSON to a file, replacing any existing file.
pub fn write_profiles(store: &ProfileStore, path: &Path) -> Result<(), PipelineError> {
    let content = generate_profiles_json(store)?;

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    info!("Wrote {} profiles to {}", store.len(), path.display());
    Ok(())
}
