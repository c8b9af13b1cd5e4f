//! On-disk cache of downloaded tables.

use super::DatasetSource;
use crate::error::LoadError;
use crate::models::Table;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Location of the cached table for a dataset split.
///
/// `owner/name` identifiers become `owner__name` directories.
pub fn cache_path(cache_dir: &Path, source: &DatasetSource) -> PathBuf {
    cache_dir
        .join(source.id.replace('/', "__"))
        .join(format!("{}-{}.json", source.config, source.split))
}

/// Read a cached table. `Ok(None)` if nothing is cached yet.
pub fn read_cached(path: &Path) -> Result<Option<Table>, LoadError> {
    if !path.exists() {
        debug!("No cached table at {}", path.display());
        return Ok(None);
    }

    let content = std::fs::read(path).map_err(|source| LoadError::Cache {
        path: path.to_path_buf(),
        source,
    })?;

    let table = serde_json::from_slice(&content).map_err(|source| LoadError::CorruptCache {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Some(table))
}

/// Store a table in the cache, creating directories as needed.
pub fn write_cached(path: &Path, table: &Table) -> Result<(), LoadError> {
    let cache_err = |source: std::io::Error| LoadError::Cache {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(cache_err)?;
    }

    let content = serde_json::to_vec(table).map_err(|source| LoadError::CorruptCache {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, content).map_err(cache_err)?;

    debug!("Cached {} rows at {}", table.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_cache_path() {
        let source = DatasetSource::default();
        let path = cache_path(Path::new("/tmp/cache"), &source);
        assert_eq!(
            path,
            PathBuf::from("/tmp/cache/zijuncheng__synthetic_profiles_ver_1/default-train.json")
        );
    }

    #[test]
    fn test_cache_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("table.json");

        assert!(read_cached(&path).unwrap().is_none());

        let mut table = Table::new(vec!["persona".to_string()]);
        table.rows.push(vec![json!("Student")]);
        write_cached(&path, &table).unwrap();

        assert_eq!(read_cached(&path).unwrap(), Some(table));
    }

    #[test]
    fn test_corrupt_cache() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("table.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            read_cached(&path),
            Err(LoadError::CorruptCache { .. })
        ));
    }
}
