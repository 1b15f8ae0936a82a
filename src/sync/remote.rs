use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use super::webdav::WebDAVError;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("WebDAV error: {0}")]
    WebDAV(#[from] WebDAVError),
    #[error("Remote store unreachable")]
    Offline,
    #[error("Remote payload is not UTF-8")]
    Encoding,
}

/// Shared key/value store visible to every device.
///
/// `get` returns `Ok(None)` for a key that was never written. Transport and
/// authorization failures are errors.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, RemoteError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), RemoteError>;
}

/// In-process shared store with a switch that simulates losing the network
#[derive(Default)]
pub struct MemoryRemote {
    entries: Mutex<HashMap<String, String>>,
    offline: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Seed a raw value without going through the async API
    pub fn insert_raw(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn get(&self, key: &str) -> Result<Option<String>, RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Offline);
        }
        Ok(self.get_raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Offline);
        }
        self.insert_raw(key, value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_remote_roundtrip() {
        let remote = MemoryRemote::new();
        assert!(remote.get("k").await.unwrap().is_none());

        remote.set("k", "[1]").await.unwrap();
        assert_eq!(remote.get("k").await.unwrap().as_deref(), Some("[1]"));
        assert_eq!(remote.write_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_remote_offline() {
        let remote = MemoryRemote::new();
        remote.set_offline(true);
        assert!(matches!(remote.get("k").await, Err(RemoteError::Offline)));
        assert!(matches!(remote.set("k", "1").await, Err(RemoteError::Offline)));
        assert_eq!(remote.write_count(), 0);
    }
}
