use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Account;

/// Shared custom sets (envelope)
pub const SYNC_CUSTOM: &str = "fr_custom_v7";
/// Shared priority overrides (envelope)
pub const SYNC_PRIORITY: &str = "fr_priority_v7";
/// Session records of every account (envelope around an account map)
pub const SYNC_RECORDS: &str = "fr_records_v7";
/// Review state of every account (envelope around an account map)
pub const SYNC_SRS: &str = "fr_srs_v7";
/// Current account marker, local only
pub const LOCAL_ACCOUNT: &str = "fr_account_v7";

/// Local per-account session records (bare JSON array)
pub fn local_records_key(account: Account) -> String {
    format!("{}_{}", SYNC_RECORDS, account.as_str())
}

/// Local per-account review state (bare JSON object)
pub fn local_srs_key(account: Account) -> String {
    format!("{}_{}", SYNC_SRS, account.as_str())
}

/// The four synchronised buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketId {
    CustomSets,
    PriorityOverrides,
    Records,
    ReviewState,
}

impl BucketId {
    /// Key of the bucket in the shared store
    pub fn key(&self) -> &'static str {
        match self {
            BucketId::CustomSets => SYNC_CUSTOM,
            BucketId::PriorityOverrides => SYNC_PRIORITY,
            BucketId::Records => SYNC_RECORDS,
            BucketId::ReviewState => SYNC_SRS,
        }
    }

    /// Per-account buckets only ever replace the caller's entry
    pub fn is_per_account(&self) -> bool {
        matches!(self, BucketId::Records | BucketId::ReviewState)
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Current sync state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// Nothing in flight
    #[default]
    Idle,
    /// A pull or push is running
    Syncing,
    /// Last operation succeeded; reverts to idle shortly after
    #[serde(rename = "ok")]
    Success,
    /// Last operation failed; stays until the next attempt
    Error,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncState::Idle => "idle",
            SyncState::Syncing => "syncing",
            SyncState::Success => "ok",
            SyncState::Error => "error",
        };
        f.write_str(label)
    }
}

/// What caused a pull
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullTrigger {
    /// First load after start-up
    Startup,
    /// The app came back to the foreground; the CLI has no foreground
    /// hook, so only long-lived embedders raise it
    Resume,
    /// The user asked for a refresh
    Manual,
}

impl fmt::Display for PullTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PullTrigger::Startup => "startup",
            PullTrigger::Resume => "resume",
            PullTrigger::Manual => "manual",
        };
        f.write_str(label)
    }
}

/// Shared store connection settings.
///
/// Debug output masks the password.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct RemoteConfig {
    /// WebDAV server URL (e.g., "https://cloud.example.com/remote.php/dav/files/user/")
    pub server_url: String,
    /// Remote path within the WebDAV server
    #[serde(default = "default_remote_path")]
    pub remote_path: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("server_url", &self.server_url)
            .field("remote_path", &self.remote_path)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

fn default_remote_path() -> String {
    "flashdrill".to_string()
}

/// Credentials for WebDAV authentication
#[derive(Debug, Clone)]
pub struct SyncCredentials {
    pub username: String,
    pub password: String,
}

impl RemoteConfig {
    pub fn credentials(&self) -> SyncCredentials {
        SyncCredentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}
