use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use thiserror::Error;

use crate::sync::config::SyncCredentials;

/// WebDAV client for bucket reads and writes
pub struct WebDAVClient {
    client: Client,
    base_url: String,
    credentials: SyncCredentials,
}

#[derive(Error, Debug)]
pub enum WebDAVError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Authentication failed")]
    AuthFailed,
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl WebDAVClient {
    /// Create a new WebDAV client
    pub fn new(base_url: String, credentials: SyncCredentials) -> Result<Self, WebDAVError> {
        // Normalize URL - ensure no trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(WebDAVError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        // Bucket payloads are small; fail fast so the app drops to local mode quickly
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    /// Build full URL for a path
    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// GET - Download file contents; `None` when the file does not exist
    pub async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, WebDAVError> {
        let url = self.url(path);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(WebDAVError::AuthFailed),
            StatusCode::NOT_FOUND => Ok(None),
            status if !status.is_success() => Err(WebDAVError::Server {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
            _ => Ok(Some(response.bytes().await?.to_vec())),
        }
    }

    /// PUT - Upload file contents, replacing what is there
    pub async fn put(&self, path: &str, data: &[u8]) -> Result<(), WebDAVError> {
        let url = self.url(path);

        let response = self
            .client
            .put(&url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .header("Content-Type", "application/json")
            .body(data.to_vec())
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED | StatusCode::NO_CONTENT | StatusCode::OK => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(WebDAVError::AuthFailed),
            status => Err(WebDAVError::Server {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// MKCOL - Create a directory
    pub async fn mkcol(&self, path: &str) -> Result<(), WebDAVError> {
        let url = self.url(path);
        let method = Method::from_bytes(b"MKCOL")
            .map_err(|e| WebDAVError::InvalidUrl(e.to_string()))?;

        let response = self
            .client
            .request(method, &url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED | StatusCode::OK => Ok(()),
            StatusCode::METHOD_NOT_ALLOWED => {
                // Directory might already exist, that's OK
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(WebDAVError::AuthFailed),
            status => Err(WebDAVError::Server {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Create directory structure recursively
    pub async fn mkdir_p(&self, path: &str) -> Result<(), WebDAVError> {
        let mut current_path = String::new();

        for part in path.trim_matches('/').split('/') {
            if part.is_empty() {
                continue;
            }
            current_path = if current_path.is_empty() {
                part.to_string()
            } else {
                format!("{}/{}", current_path, part)
            };
            self.mkcol(&current_path).await?;
        }

        Ok(())
    }

    /// HEAD - Check that the server answers and accepts the credentials
    pub async fn test_connection(&self) -> Result<bool, WebDAVError> {
        let response = self
            .client
            .head(&self.base_url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(WebDAVError::AuthFailed),
            status => Ok(status.is_success() || status == StatusCode::METHOD_NOT_ALLOWED),
        }
    }
}
