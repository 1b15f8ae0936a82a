mod client;

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

pub use client::{WebDAVClient, WebDAVError};

use super::config::RemoteConfig;
use super::remote::{RemoteError, RemoteStore};

/// Shared store backed by one JSON file per bucket on a WebDAV server
pub struct WebDavRemote {
    client: WebDAVClient,
    remote_path: String,
    collection_ready: AtomicBool,
}

impl WebDavRemote {
    pub fn new(config: &RemoteConfig) -> Result<Self, WebDAVError> {
        let client = WebDAVClient::new(config.server_url.clone(), config.credentials())?;
        Ok(Self {
            client,
            remote_path: config.remote_path.trim_matches('/').to_string(),
            collection_ready: AtomicBool::new(false),
        })
    }

    pub async fn test_connection(&self) -> Result<bool, WebDAVError> {
        self.client.test_connection().await
    }

    fn bucket_path(&self, key: &str) -> String {
        if self.remote_path.is_empty() {
            format!("{}.json", key)
        } else {
            format!("{}/{}.json", self.remote_path, key)
        }
    }
}

#[async_trait]
impl RemoteStore for WebDavRemote {
    async fn get(&self, key: &str) -> Result<Option<String>, RemoteError> {
        match self.client.get(&self.bucket_path(key)).await? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| RemoteError::Encoding),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RemoteError> {
        if !self.collection_ready.load(Ordering::SeqCst) {
            self.client.mkdir_p(&self.remote_path).await?;
            self.collection_ready.store(true, Ordering::SeqCst);
        }
        self.client.put(&self.bucket_path(key), value.as_bytes()).await?;
        Ok(())
    }
}
