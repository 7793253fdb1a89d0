//! Helpers for wiring storage from configuration

use crate::config::{AppConfig, StorageBackend};
use crate::storage::{FileStore, MemoryStore, SqliteStore};
use anyhow::{Context, Result};
use career_compass_sdk::KeyValueStore;
use std::path::PathBuf;

/// Platform data directory, or `./.career-compass` when none can be determined
pub fn default_data_dir() -> PathBuf {
    use directories::ProjectDirs;

    if let Some(proj_dirs) = ProjectDirs::from("com", "career-compass", "career-compass") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        PathBuf::from(".career-compass")
    }
}

/// Open the backend selected by `config`
pub fn open_store(config: &AppConfig) -> Result<Box<dyn KeyValueStore>> {
    let store: Box<dyn KeyValueStore> = match config.storage {
        StorageBackend::File => {
            let dir = config.data_dir.join("records");
            Box::new(
                FileStore::new(&dir)
                    .with_context(|| format!("Failed to open record directory {}", dir.display()))?,
            )
        }
        StorageBackend::Sqlite => {
            let path = config.data_dir.join("career-compass.db");
            Box::new(
                SqliteStore::new(path.clone())
                    .with_context(|| format!("Failed to open database {}", path.display()))?,
            )
        }
        StorageBackend::Memory => Box::new(MemoryStore::new()),
    };

    tracing::debug!(backend = ?config.storage, dir = %config.data_dir.display(), "storage opened");
    Ok(store)
}
