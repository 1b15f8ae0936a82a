//! Local/remote reconciliation of the shared buckets
//!
//! This module provides:
//! - The bucket keys, sync status and remote connection settings
//! - The versioned bucket envelope
//! - The remote store port with WebDAV and in-memory implementations
//! - The sync manager (pull, merge-on-write pushes, status channel)

pub mod config;
pub mod envelope;
pub mod remote;
pub mod webdav;

mod manager;

pub use config::{BucketId, PullTrigger, RemoteConfig, SyncCredentials, SyncState};
pub use envelope::SyncBucket;
pub use manager::{SyncError, SyncManager, SyncSnapshot, DEFAULT_REVERT_DELAY};
pub use remote::{MemoryRemote, RemoteError, RemoteStore};
pub use webdav::{WebDAVClient, WebDAVError, WebDavRemote};
