//! Local storage.
//!
//! Everything lives under the data directory:
//! - `storage.json`: a flat key-value map of JSON blobs (playlists,
//!   progress, settings, last sync)
//! - `raw/`: cached page snapshots used by the fetcher

mod kv;
mod store;

pub use kv::*;
pub use store::*;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store file is not a JSON object: {0}")]
    Corrupt(PathBuf),

    #[error("Stored value for {key} has an unexpected shape: {source}")]
    Unreadable {
        key: String,
        source: serde_json::Error,
    },
}

/// Storage keys, named as the browser extension named them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    Playlists,
    Progress,
    Settings,
    LastSync,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Playlists => "ytpp_playlists",
            StorageKey::Progress => "ytpp_progress",
            StorageKey::Settings => "ytpp_settings",
            StorageKey::LastSync => "ytpp_last_sync",
        }
    }
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("storage.json")
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
