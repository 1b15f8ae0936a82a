use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Local, always-available key/value port.
///
/// Reads and writes never fail from the caller's point of view: a missing or
/// unreadable key reads as `None`, and a failed write is logged and dropped.
pub trait LocalStore: Send + Sync {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&self, key: &str, value: &str);
}

/// Read a JSON value, falling back when the key is absent or malformed
pub fn get_json<T: DeserializeOwned>(store: &dyn LocalStore, key: &str, fallback: T) -> T {
    let Some(raw) = store.get_raw(key) else {
        return fallback;
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("local key {} is malformed, using default: {}", key, e);
            fallback
        }
    }
}

/// Write a JSON value, swallowing serialization and IO failures
pub fn set_json<T: Serialize + ?Sized>(store: &dyn LocalStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.set_raw(key, &raw),
        Err(e) => log::warn!("failed to serialize local key {}: {}", key, e),
    }
}

/// One JSON file per key under a base directory
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("flashdrill"))
            .ok_or(StorageError::DataDirNotFound)
    }

    /// Initialize storage directories
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.store_dir())?;
        Ok(())
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn store_dir(&self) -> PathBuf {
        self.base_path.join("store")
    }

    fn key_path(&self, key: &str) -> PathBuf {
        // Keys are fixed identifiers like "fr_srs_v7_child"; keep them filesystem safe anyway.
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.store_dir().join(format!("{}.json", file_name))
    }

    fn try_set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write to a sibling file first so a crash never leaves a half-written key
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl LocalStore for FileStorage {
    fn get_raw(&self, key: &str) -> Option<String> {
        let path = self.key_path(key);
        if !path.exists() {
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                log::warn!("failed to read local key {}: {}", key, e);
                None
            }
        }
    }

    fn set_raw(&self, key: &str, value: &str) {
        if let Err(e) = self.try_set(key, value) {
            log::warn!("failed to write local key {}: {}", key, e);
        }
    }
}

/// In-process store, used by tests and as a scratch store for the CLI's dry runs
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStorage {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set_raw(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }
}
