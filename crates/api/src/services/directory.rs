//! Loads the subject directory snapshot used by the in-memory adapters.

use std::path::Path;

use domain::services::{DirectorySnapshot, InMemoryDirectory};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DirectoryLoadError {
    #[error("Failed to read directory file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid directory file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads a JSON [`DirectorySnapshot`]. An empty path yields an empty
/// directory, so every subject lookup fails with not-found.
pub fn load_directory(path: &str) -> Result<InMemoryDirectory, DirectoryLoadError> {
    if path.trim().is_empty() {
        warn!("geofence.directory_path not set, starting with an empty directory");
        return Ok(InMemoryDirectory::new());
    }

    let raw = std::fs::read_to_string(Path::new(path)).map_err(|source| DirectoryLoadError::Io {
        path: path.to_string(),
        source,
    })?;
    let snapshot: DirectorySnapshot =
        serde_json::from_str(&raw).map_err(|source| DirectoryLoadError::Parse {
            path: path.to_string(),
            source,
        })?;

    info!(path = %path, "Loading subject directory");
    Ok(InMemoryDirectory::from_snapshot(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_path_gives_empty_directory() {
        let directory = load_directory("").unwrap();
        assert_eq!(directory.subject_count().await, 0);
    }

    #[test]
    fn test_missing_file() {
        let err = load_directory("/nonexistent/directory.json").unwrap_err();
        assert!(matches!(err, DirectoryLoadError::Io { .. }));
    }

    #[tokio::test]
    async fn test_sample_directory_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/directory.json");
        let directory = load_directory(path).unwrap();
        assert!(directory.subject_count().await > 0);
    }

    #[test]
    fn test_malformed_file() {
        let path = std::env::temp_dir().join(format!("directory-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "{not json").unwrap();
        let err = load_directory(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, DirectoryLoadError::Parse { .. }));
        let _ = std::fs::remove_file(path);
    }
}
