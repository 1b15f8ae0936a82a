//! Application configuration.
//!
//! Stored as TOML at `<data dir>/config.toml`. Every field is optional in the
//! file. Without a `[remote]` table the app runs local-only.
//!
//! Environment overrides: `FLASHDRILL_DATA_DIR`, `FLASHDRILL_REMOTE_PASSWORD`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::PolicyKind;
use crate::storage::FileStorage;
use crate::sync::RemoteConfig;

pub const CONFIG_FILE: &str = "config.toml";
pub const DATA_DIR_ENV: &str = "FLASHDRILL_DATA_DIR";
pub const REMOTE_PASSWORD_ENV: &str = "FLASHDRILL_REMOTE_PASSWORD";

/// Flash durations offered by the study screen, in seconds
pub const FLASH_TIMES: [u32; 4] = [1, 2, 3, 5];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Seconds a set stays on screen
    #[serde(default = "default_flash_time")]
    pub flash_time: u32,
    /// Sets per session
    #[serde(default = "default_session_size")]
    pub session_size: usize,
    /// Delay before an `ok` sync status goes back to idle
    #[serde(default = "default_status_revert_ms")]
    pub status_revert_ms: u64,
    /// Pause between the flash and the recall prompt
    #[serde(default = "default_flash_grace_ms")]
    pub flash_grace_ms: u64,
    #[serde(default)]
    pub policy: PolicyKind,
    /// Built-in seed dataset
    #[serde(default = "default_dataset")]
    pub dataset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
}

fn default_flash_time() -> u32 {
    3
}
fn default_session_size() -> usize {
    5
}
fn default_status_revert_ms() -> u64 {
    2500
}
fn default_flash_grace_ms() -> u64 {
    300
}
fn default_dataset() -> String {
    "words".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            flash_time: default_flash_time(),
            session_size: default_session_size(),
            status_revert_ms: default_status_revert_ms(),
            flash_grace_ms: default_flash_grace_ms(),
            policy: PolicyKind::default(),
            dataset: default_dataset(),
            remote: None,
        }
    }
}

impl AppConfig {
    /// Data directory, honouring `FLASHDRILL_DATA_DIR`
    pub fn data_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        FileStorage::default_data_dir().map_err(|_| ConfigError::DataDirNotFound)
    }

    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE)
    }

    /// Load `<data_dir>/config.toml` (defaults when absent) and apply env overrides
    pub fn load(data_dir: &Path) -> Result<Self> {
        let mut config = Self::load_from(&Self::path_in(data_dir))?;
        config.apply_password_override(std::env::var(REMOTE_PASSWORD_ENV).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config.normalized())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Write a default config unless one exists; returns the path
    pub fn init(data_dir: &Path) -> Result<PathBuf> {
        let path = Self::path_in(data_dir);
        if !path.exists() {
            Self::default().save_to(&path)?;
            log::info!("wrote default config to {}", path.display());
        }
        Ok(path)
    }

    fn apply_password_override(&mut self, password: Option<String>) {
        if let (Some(remote), Some(password)) = (self.remote.as_mut(), password) {
            remote.password = password;
        }
    }

    /// Zero values would stall the session or the queue
    fn normalized(mut self) -> Self {
        self.flash_time = self.flash_time.max(1);
        self.session_size = self.session_size.max(1);
        self
    }

    pub fn revert_delay(&self) -> Duration {
        Duration::from_millis(self.status_revert_ms)
    }

    pub fn flash_grace(&self) -> Duration {
        Duration::from_millis(self.flash_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&AppConfig::path_in(dir.path())).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.flash_time, 3);
        assert_eq!(config.session_size, 5);
        assert_eq!(config.policy, PolicyKind::Level);
        assert!(config.remote.is_none());
    }

    #[test]
    fn test_partial_file_and_remote_table() {
        let dir = TempDir::new().unwrap();
        let path = AppConfig::path_in(dir.path());
        fs::write(
            &path,
            r#"
flash_time = 5
policy = "interval"

[remote]
server_url = "https://dav.example.com/files/me"
username = "me"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.flash_time, 5);
        assert_eq!(config.session_size, 5);
        assert_eq!(config.policy, PolicyKind::Interval);
        let remote = config.remote.unwrap();
        assert_eq!(remote.remote_path, "flashdrill");
        assert_eq!(remote.username, "me");
    }

    #[test]
    fn test_init_then_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = AppConfig::init(dir.path()).unwrap();
        assert!(path.exists());

        let mut config = AppConfig::load_from(&path).unwrap();
        config.session_size = 8;
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().session_size, 8);
    }

    #[test]
    fn test_zero_values_are_raised() {
        let dir = TempDir::new().unwrap();
        let path = AppConfig::path_in(dir.path());
        fs::write(&path, "flash_time = 0\nsession_size = 0\n").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.flash_time, 1);
        assert_eq!(config.session_size, 1);
    }

    #[test]
    fn test_password_override_needs_remote() {
        let mut config = AppConfig::default();
        config.apply_password_override(Some("secret".to_string()));
        assert!(config.remote.is_none());

        config.remote = Some(RemoteConfig {
            server_url: "https://dav.example.com".to_string(),
            remote_path: "flashdrill".to_string(),
            username: "me".to_string(),
            password: String::new(),
        });
        config.apply_password_override(Some("secret".to_string()));
        assert_eq!(config.remote.unwrap().password, "secret");
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = AppConfig::path_in(dir.path());
        fs::write(&path, "flash_time = [").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
