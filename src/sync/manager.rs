use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::watch;

use crate::catalog::{Account, PriorityOverrides, WordSet};
use crate::flashcards::{append_records, Clock, ReviewStateMap, SessionRecord};
use crate::storage::{get_json, set_json, LocalStore};

use super::config::{
    local_records_key, local_srs_key, BucketId, PullTrigger, SyncState, LOCAL_ACCOUNT, SYNC_CUSTOM, SYNC_PRIORITY,
    SYNC_RECORDS, SYNC_SRS,
};
use super::envelope::{unwrap_raw, SyncBucket};
use super::remote::{RemoteError, RemoteStore};

/// Default delay before a successful status falls back to idle
pub const DEFAULT_REVERT_DELAY: Duration = Duration::from_millis(2500);

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// In-memory view of every bucket for the active account
#[derive(Debug, Clone, Default)]
pub struct SyncSnapshot {
    pub account: Account,
    pub custom_sets: Vec<WordSet>,
    pub overrides: PriorityOverrides,
    pub records: Vec<SessionRecord>,
    pub review_states: ReviewStateMap,
}

/// Mirrors the four buckets between local storage and the shared remote store.
///
/// Local storage is written first and always wins locally; the remote write is
/// best effort and only reported through the status channel.
pub struct SyncManager {
    local: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteStore>>,
    clock: Arc<dyn Clock>,
    snapshot: Mutex<SyncSnapshot>,
    status: Arc<watch::Sender<SyncState>>,
    /// Bumped on every status change so a stale revert task does nothing
    status_generation: Arc<AtomicU64>,
    ready: AtomicBool,
    revert_delay: Duration,
}

impl SyncManager {
    /// Build a manager and load the local copy of every bucket
    pub fn new(local: Arc<dyn LocalStore>, remote: Option<Arc<dyn RemoteStore>>, clock: Arc<dyn Clock>) -> Self {
        let account: Account = get_json(local.as_ref(), LOCAL_ACCOUNT, Account::default());
        let snapshot = SyncSnapshot {
            account,
            custom_sets: read_local_bucket(local.as_ref(), SYNC_CUSTOM).unwrap_or_default(),
            overrides: read_local_bucket(local.as_ref(), SYNC_PRIORITY).unwrap_or_default(),
            records: get_json(local.as_ref(), &local_records_key(account), Vec::new()),
            review_states: get_json(local.as_ref(), &local_srs_key(account), ReviewStateMap::new()),
        };
        let (status, _) = watch::channel(SyncState::Idle);

        Self {
            local,
            remote,
            clock,
            snapshot: Mutex::new(snapshot),
            status: Arc::new(status),
            status_generation: Arc::new(AtomicU64::new(0)),
            ready: AtomicBool::new(false),
            revert_delay: DEFAULT_REVERT_DELAY,
        }
    }

    pub fn with_revert_delay(mut self, delay: Duration) -> Self {
        self.revert_delay = delay;
        self
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// True once the first pull has settled, successfully or not
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> SyncState {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.status.subscribe()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.lock_snapshot().clone()
    }

    pub fn account(&self) -> Account {
        self.lock_snapshot().account
    }

    pub fn custom_sets(&self) -> Vec<WordSet> {
        self.lock_snapshot().custom_sets.clone()
    }

    pub fn overrides(&self) -> PriorityOverrides {
        self.lock_snapshot().overrides.clone()
    }

    pub fn records(&self) -> Vec<SessionRecord> {
        self.lock_snapshot().records.clone()
    }

    pub fn review_states(&self) -> ReviewStateMap {
        self.lock_snapshot().review_states.clone()
    }

    fn lock_snapshot(&self) -> MutexGuard<'_, SyncSnapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, state: SyncState) {
        let generation = self.status_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.status.send_replace(state);

        if state == SyncState::Success {
            let status = Arc::clone(&self.status);
            let generations = Arc::clone(&self.status_generation);
            let delay = self.revert_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if generations.load(Ordering::SeqCst) == generation {
                    status.send_replace(SyncState::Idle);
                }
            });
        }
    }

    /// Switch the active account and reload its slice from local storage
    pub fn switch_account(&self, account: Account) {
        set_json(self.local.as_ref(), LOCAL_ACCOUNT, &account);
        let records = get_json(self.local.as_ref(), &local_records_key(account), Vec::new());
        let review_states = get_json(self.local.as_ref(), &local_srs_key(account), ReviewStateMap::new());

        let mut snapshot = self.lock_snapshot();
        snapshot.account = account;
        snapshot.records = records;
        snapshot.review_states = review_states;
        log::info!("Sync: switched to {} account", account);
    }

    /// Fetch all four buckets and refresh local storage from them.
    ///
    /// On failure the local values stay in place, the status becomes
    /// `error`, and the manager is still marked ready.
    pub async fn pull(&self, trigger: PullTrigger) -> Result<()> {
        let Some(remote) = self.remote.clone() else {
            log::debug!("Sync: no remote configured, {} pull uses local data", trigger);
            let account = self.account();
            self.switch_account(account);
            self.ready.store(true, Ordering::SeqCst);
            return Ok(());
        };

        log::info!("Sync: pull started ({})", trigger);
        self.set_status(SyncState::Syncing);

        let (custom, priority, records, srs) = tokio::join!(
            remote.get(SYNC_CUSTOM),
            remote.get(SYNC_PRIORITY),
            remote.get(SYNC_RECORDS),
            remote.get(SYNC_SRS),
        );

        let fetched = custom.and_then(|c| Ok((c, priority?, records?, srs?)));
        let (custom, priority, records, srs) = match fetched {
            Ok(buckets) => buckets,
            Err(e) => {
                log::error!("Sync: pull failed, keeping local data: {}", e);
                self.set_status(SyncState::Error);
                self.ready.store(true, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        let custom_sets = self.pull_shared_bucket::<Vec<WordSet>>(SYNC_CUSTOM, custom.as_deref());
        let overrides = self.pull_shared_bucket::<PriorityOverrides>(SYNC_PRIORITY, priority.as_deref());

        let records_map = records.as_deref().and_then(unwrap_raw::<Map<String, Value>>);
        let srs_map = srs.as_deref().and_then(unwrap_raw::<Map<String, Value>>);

        let account = self.account();
        let mut active_records = Vec::new();
        let mut active_review = ReviewStateMap::new();
        for each in Account::ALL {
            let records: Vec<SessionRecord> =
                self.pull_account_slice(records_map.as_ref(), each, &local_records_key(each));
            let review: ReviewStateMap = self.pull_account_slice(srs_map.as_ref(), each, &local_srs_key(each));
            if each == account {
                active_records = records;
                active_review = review;
            }
        }

        {
            let mut snapshot = self.lock_snapshot();
            if let Some(custom_sets) = custom_sets {
                snapshot.custom_sets = custom_sets;
            }
            if let Some(overrides) = overrides {
                snapshot.overrides = overrides;
            }
            snapshot.records = active_records;
            snapshot.review_states = active_review;
        }

        self.ready.store(true, Ordering::SeqCst);
        self.set_status(SyncState::Success);
        log::info!("Sync: pull finished ({})", trigger);
        Ok(())
    }

    /// Unwrap a shared bucket and cache it locally; `None` keeps the cached value
    fn pull_shared_bucket<T>(&self, key: &str, raw: Option<&str>) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let Some(value) = raw.and_then(unwrap_raw::<T>) else {
            log::debug!("Sync: remote {} empty or malformed, using local cache", key);
            return None;
        };
        write_local_bucket(self.local.as_ref(), key, &value, self.clock.as_ref());
        Some(value)
    }

    /// Take one account's entry from a per-account bucket, falling back to local storage
    fn pull_account_slice<T>(&self, remote: Option<&Map<String, Value>>, account: Account, local_key: &str) -> T
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let from_remote = remote
            .and_then(|map| map.get(account.as_str()))
            .and_then(|value| match serde_json::from_value::<T>(value.clone()) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    log::warn!("Sync: remote slice {} is malformed, using local: {}", local_key, e);
                    None
                }
            });

        match from_remote {
            Some(value) => {
                set_json(self.local.as_ref(), local_key, &value);
                value
            }
            None => get_json(self.local.as_ref(), local_key, T::default()),
        }
    }

    /// Apply `updater` to the custom-set bucket
    pub async fn update_custom_sets<F>(&self, updater: F) -> Vec<WordSet>
    where
        F: Fn(Vec<WordSet>) -> Vec<WordSet> + Send + Sync,
    {
        let current = self.custom_sets();
        let updated = updater(current.clone());
        self.lock_snapshot().custom_sets = updated.clone();
        write_local_bucket(self.local.as_ref(), SYNC_CUSTOM, &updated, self.clock.as_ref());

        match self.push_shared(BucketId::CustomSets, current, &updater).await {
            Some(merged) => {
                self.lock_snapshot().custom_sets = merged.clone();
                write_local_bucket(self.local.as_ref(), SYNC_CUSTOM, &merged, self.clock.as_ref());
                merged
            }
            None => updated,
        }
    }

    /// Apply `updater` to the priority-override bucket
    pub async fn update_overrides<F>(&self, updater: F) -> PriorityOverrides
    where
        F: Fn(PriorityOverrides) -> PriorityOverrides + Send + Sync,
    {
        let current = self.overrides();
        let updated = updater(current.clone());
        self.lock_snapshot().overrides = updated.clone();
        write_local_bucket(self.local.as_ref(), SYNC_PRIORITY, &updated, self.clock.as_ref());

        match self.push_shared(BucketId::PriorityOverrides, current, &updater).await {
            Some(merged) => {
                self.lock_snapshot().overrides = merged.clone();
                write_local_bucket(self.local.as_ref(), SYNC_PRIORITY, &merged, self.clock.as_ref());
                merged
            }
            None => updated,
        }
    }

    /// Re-read a catalog bucket remotely, apply `updater` to that copy and write it back.
    ///
    /// Returns the merged value on success, `None` when there is no remote or
    /// the push failed.
    async fn push_shared<T, F>(&self, bucket: BucketId, fallback: T, updater: &F) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(T) -> T,
    {
        debug_assert!(!bucket.is_per_account());
        let remote = self.remote.as_ref()?;
        self.set_status(SyncState::Syncing);

        let result: Result<T> = async {
            let raw = remote.get(bucket.key()).await?;
            let base = raw.as_deref().and_then(unwrap_raw::<T>).unwrap_or(fallback);
            let merged = updater(base);
            let body = serde_json::to_string(&SyncBucket::wrap(&merged, self.clock.now()))?;
            remote.set(bucket.key(), &body).await?;
            Ok(merged)
        }
        .await;

        match result {
            Ok(merged) => {
                log::info!("Sync: pushed {}", bucket);
                self.set_status(SyncState::Success);
                Some(merged)
            }
            Err(e) => {
                log::error!("Sync: push of {} failed, kept locally: {}", bucket, e);
                self.set_status(SyncState::Error);
                None
            }
        }
    }

    /// Apply `updater` to the active account's session records
    pub async fn update_records<F>(&self, updater: F) -> Vec<SessionRecord>
    where
        F: FnOnce(Vec<SessionRecord>) -> Vec<SessionRecord>,
    {
        let (account, updated) = {
            let mut snapshot = self.lock_snapshot();
            let updated = updater(std::mem::take(&mut snapshot.records));
            snapshot.records = updated.clone();
            (snapshot.account, updated)
        };
        set_json(self.local.as_ref(), &local_records_key(account), &updated);
        self.push_account_slice(BucketId::Records, account, &updated).await;
        updated
    }

    /// Session records of any account; an inactive one is read from local storage
    pub fn records_for(&self, account: Account) -> Vec<SessionRecord> {
        {
            let snapshot = self.lock_snapshot();
            if snapshot.account == account {
                return snapshot.records.clone();
            }
        }
        get_json(self.local.as_ref(), &local_records_key(account), Vec::new())
    }

    /// Empty an account's records locally and in its remote slice
    pub async fn clear_records(&self, account: Account) {
        if account == self.account() {
            self.update_records(|_| Vec::new()).await;
        } else {
            let empty: Vec<SessionRecord> = Vec::new();
            set_json(self.local.as_ref(), &local_records_key(account), &empty);
            self.push_account_slice(BucketId::Records, account, &empty).await;
        }
        log::info!("Sync: cleared {} records", account);
    }

    /// Append finished-session records, pruning the ones past retention
    pub async fn append_session_records(&self, new_records: Vec<SessionRecord>) -> Vec<SessionRecord> {
        let today = self.clock.today();
        self.update_records(|existing| append_records(existing, new_records, today)).await
    }

    /// Apply `updater` to the active account's review state
    pub async fn update_review_states<F>(&self, updater: F) -> ReviewStateMap
    where
        F: FnOnce(ReviewStateMap) -> ReviewStateMap,
    {
        let (account, updated) = {
            let mut snapshot = self.lock_snapshot();
            let updated = updater(std::mem::take(&mut snapshot.review_states));
            snapshot.review_states = updated.clone();
            (snapshot.account, updated)
        };
        set_json(self.local.as_ref(), &local_srs_key(account), &updated);
        self.push_account_slice(BucketId::ReviewState, account, &updated).await;
        updated
    }

    /// Replace only `account`'s entry of a per-account remote bucket.
    ///
    /// Skipped until the first pull has settled so start-up defaults never
    /// overwrite remote data.
    async fn push_account_slice<T: Serialize>(&self, bucket: BucketId, account: Account, value: &T) {
        debug_assert!(bucket.is_per_account());
        let Some(remote) = self.remote.as_ref() else {
            return;
        };
        if !self.is_ready() {
            log::debug!("Sync: {} not pushed, first pull has not settled", bucket);
            return;
        }
        self.set_status(SyncState::Syncing);

        let result: Result<()> = async {
            let raw = remote.get(bucket.key()).await?;
            let mut map = raw
                .as_deref()
                .and_then(unwrap_raw::<Map<String, Value>>)
                .unwrap_or_default();
            map.insert(account.as_str().to_string(), serde_json::to_value(value)?);
            let body = serde_json::to_string(&SyncBucket::wrap(&map, self.clock.now()))?;
            remote.set(bucket.key(), &body).await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                log::info!("Sync: pushed {} for {}", bucket, account);
                self.set_status(SyncState::Success);
            }
            Err(e) => {
                log::error!("Sync: push of {} for {} failed, kept locally: {}", bucket, account, e);
                self.set_status(SyncState::Error);
            }
        }
    }
}

/// Local copies of the shared buckets are kept in the same envelope format
fn read_local_bucket<T: DeserializeOwned>(local: &dyn LocalStore, key: &str) -> Option<T> {
    local.get_raw(key).as_deref().and_then(unwrap_raw::<T>)
}

fn write_local_bucket<T: Serialize>(local: &dyn LocalStore, key: &str, value: &T, clock: &dyn Clock) {
    set_json(local, key, &SyncBucket::wrap(value, clock.now()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Mode, Owner};
    use crate::flashcards::{FixedClock, ReviewState};
    use crate::storage::MemoryStorage;
    use crate::sync::remote::MemoryRemote;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()))
    }

    fn custom(id: &str) -> WordSet {
        WordSet::new(
            id.to_string(),
            Mode::Chunk,
            Owner::Child,
            id.to_string(),
            2,
            vec!["a".to_string(), "b".to_string()],
        )
    }

    fn record(date: &str, correct: u32) -> SessionRecord {
        SessionRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            mode: Mode::Chunk,
            sets: 1,
            correct,
            words: 5,
        }
    }

    fn manager(local: Arc<MemoryStorage>, remote: Option<Arc<MemoryRemote>>) -> SyncManager {
        let remote = remote.map(|r| r as Arc<dyn RemoteStore>);
        SyncManager::new(local, remote, clock())
    }

    #[tokio::test]
    async fn test_push_then_pull_round_trip() {
        let remote = Arc::new(MemoryRemote::new());
        let first = manager(Arc::new(MemoryStorage::new()), Some(remote.clone()));
        first.pull(PullTrigger::Startup).await.unwrap();
        first.update_custom_sets(|mut sets| {
            sets.push(custom("custom_1"));
            sets
        })
        .await;

        let second = manager(Arc::new(MemoryStorage::new()), Some(remote.clone()));
        second.pull(PullTrigger::Startup).await.unwrap();
        assert_eq!(second.custom_sets(), vec![custom("custom_1")]);
    }

    #[tokio::test]
    async fn test_catalog_push_merges_into_remote_copy() {
        let remote = Arc::new(MemoryRemote::new());
        let a = manager(Arc::new(MemoryStorage::new()), Some(remote.clone()));
        let b = manager(Arc::new(MemoryStorage::new()), Some(remote.clone()));
        a.pull(PullTrigger::Startup).await.unwrap();
        b.pull(PullTrigger::Startup).await.unwrap();

        a.update_overrides(|mut o| {
            o.insert("s1".to_string(), 3);
            o
        })
        .await;
        // b never saw s1 locally, but its push applies to the remote copy
        let merged = b
            .update_overrides(|mut o| {
                o.insert("s2".to_string(), -1);
                o
            })
            .await;

        assert_eq!(merged.get("s1"), Some(&3));
        assert_eq!(merged.get("s2"), Some(&-1));
        assert_eq!(b.overrides(), merged);
    }

    #[tokio::test]
    async fn test_pull_failure_keeps_local_and_marks_ready() {
        let local = Arc::new(MemoryStorage::new());
        set_json(local.as_ref(), &local_records_key(Account::Child), &vec![record("2024-05-30", 4)]);
        let remote = Arc::new(MemoryRemote::new());
        remote.set_offline(true);

        let sync = manager(local, Some(remote));
        assert!(!sync.is_ready());
        assert!(sync.pull(PullTrigger::Startup).await.is_err());

        assert_eq!(sync.status(), SyncState::Error);
        assert!(sync.is_ready());
        assert_eq!(sync.records(), vec![record("2024-05-30", 4)]);
    }

    #[tokio::test]
    async fn test_per_account_push_preserves_other_account() {
        let remote = Arc::new(MemoryRemote::new());
        let parent_device = manager(Arc::new(MemoryStorage::new()), Some(remote.clone()));
        parent_device.switch_account(Account::Parent);
        parent_device.pull(PullTrigger::Startup).await.unwrap();
        parent_device
            .update_records(|mut r| {
                r.push(record("2024-06-01", 2));
                r
            })
            .await;

        let child_device = manager(Arc::new(MemoryStorage::new()), Some(remote.clone()));
        child_device.pull(PullTrigger::Startup).await.unwrap();
        child_device
            .update_records(|mut r| {
                r.push(record("2024-06-01", 5));
                r
            })
            .await;

        let raw = remote.get_raw(SYNC_RECORDS).unwrap();
        let map: Map<String, Value> = unwrap_raw(&raw).unwrap();
        let parent: Vec<SessionRecord> = serde_json::from_value(map["parent"].clone()).unwrap();
        let child: Vec<SessionRecord> = serde_json::from_value(map["child"].clone()).unwrap();
        assert_eq!(parent, vec![record("2024-06-01", 2)]);
        assert_eq!(child, vec![record("2024-06-01", 5)]);
    }

    #[tokio::test]
    async fn test_per_account_writes_wait_for_first_pull() {
        let remote = Arc::new(MemoryRemote::new());
        let local = Arc::new(MemoryStorage::new());
        let sync = manager(local.clone(), Some(remote.clone()));

        let state = ReviewState {
            level: 2,
            ..ReviewState::default()
        };
        sync.update_review_states(|mut m| {
            m.insert("s1".to_string(), state.clone());
            m
        })
        .await;

        assert_eq!(remote.write_count(), 0);
        let stored: ReviewStateMap = get_json(local.as_ref(), &local_srs_key(Account::Child), ReviewStateMap::new());
        assert_eq!(stored.get("s1"), Some(&state));
    }

    #[tokio::test]
    async fn test_push_failure_keeps_local_value() {
        let remote = Arc::new(MemoryRemote::new());
        let sync = manager(Arc::new(MemoryStorage::new()), Some(remote.clone()));
        sync.pull(PullTrigger::Startup).await.unwrap();
        remote.set_offline(true);

        let sets = sync
            .update_custom_sets(|mut sets| {
                sets.push(custom("custom_2"));
                sets
            })
            .await;

        assert_eq!(sets, vec![custom("custom_2")]);
        assert_eq!(sync.custom_sets(), vec![custom("custom_2")]);
        assert_eq!(sync.status(), SyncState::Error);
    }

    #[tokio::test]
    async fn test_append_prunes_old_records() {
        let sync = manager(Arc::new(MemoryStorage::new()), None);
        sync.update_records(|_| vec![record("2023-06-02", 1), record("2023-06-03", 2)]).await;

        let records = sync.append_session_records(vec![record("2024-06-01", 3)]).await;
        assert_eq!(records, vec![record("2023-06-03", 2), record("2024-06-01", 3)]);
    }

    #[tokio::test]
    async fn test_switch_account_reloads_slice() {
        let local = Arc::new(MemoryStorage::new());
        set_json(local.as_ref(), &local_records_key(Account::Parent), &vec![record("2024-05-01", 1)]);
        let sync = manager(local.clone(), None);
        assert!(sync.records().is_empty());

        sync.switch_account(Account::Parent);
        assert_eq!(sync.account(), Account::Parent);
        assert_eq!(sync.records(), vec![record("2024-05-01", 1)]);

        let reopened = manager(local, None);
        assert_eq!(reopened.account(), Account::Parent);
    }

    #[tokio::test]
    async fn test_records_for_and_clear_inactive_account() {
        let local = Arc::new(MemoryStorage::new());
        set_json(local.as_ref(), &local_records_key(Account::Parent), &vec![record("2024-05-01", 1)]);
        let sync = manager(local.clone(), None);
        sync.update_records(|_| vec![record("2024-05-02", 2)]).await;

        assert_eq!(sync.records_for(Account::Parent), vec![record("2024-05-01", 1)]);
        assert_eq!(sync.records_for(Account::Child), vec![record("2024-05-02", 2)]);

        sync.clear_records(Account::Parent).await;
        assert!(sync.records_for(Account::Parent).is_empty());
        assert_eq!(sync.records().len(), 1);
    }

    #[tokio::test]
    async fn test_clearing_inactive_records_survives_next_pull() {
        let remote = Arc::new(MemoryRemote::new());
        let child_device = manager(Arc::new(MemoryStorage::new()), Some(remote.clone()));
        child_device.pull(PullTrigger::Startup).await.unwrap();
        child_device.append_session_records(vec![record("2024-06-01", 5)]).await;

        let parent_local = Arc::new(MemoryStorage::new());
        let parent_device = manager(parent_local.clone(), Some(remote.clone()));
        parent_device.switch_account(Account::Parent);
        parent_device.pull(PullTrigger::Startup).await.unwrap();
        assert_eq!(parent_device.records_for(Account::Child), vec![record("2024-06-01", 5)]);

        parent_device.clear_records(Account::Child).await;

        let reopened = manager(parent_local, Some(remote.clone()));
        reopened.pull(PullTrigger::Manual).await.unwrap();
        assert!(reopened.records_for(Account::Child).is_empty());

        child_device.pull(PullTrigger::Manual).await.unwrap();
        assert!(child_device.records().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_remote_falls_back_to_local() {
        let local = Arc::new(MemoryStorage::new());
        write_local_bucket(local.as_ref(), SYNC_CUSTOM, &vec![custom("custom_3")], clock().as_ref());
        let remote = Arc::new(MemoryRemote::new());
        remote.insert_raw(SYNC_CUSTOM, "{not json");

        let sync = manager(local, Some(remote));
        sync.pull(PullTrigger::Resume).await.unwrap();
        assert_eq!(sync.custom_sets(), vec![custom("custom_3")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_status_reverts_to_idle() {
        let remote = Arc::new(MemoryRemote::new());
        let sync = manager(Arc::new(MemoryStorage::new()), Some(remote));
        sync.pull(PullTrigger::Manual).await.unwrap();
        assert_eq!(sync.status(), SyncState::Success);

        tokio::time::sleep(Duration::from_millis(2600)).await;
        assert_eq!(sync.status(), SyncState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_does_not_revert() {
        let remote = Arc::new(MemoryRemote::new());
        remote.set_offline(true);
        let sync = manager(Arc::new(MemoryStorage::new()), Some(remote));
        let _ = sync.pull(PullTrigger::Manual).await;

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(sync.status(), SyncState::Error);
    }

    #[tokio::test]
    async fn test_local_only_pull_marks_ready() {
        let sync = manager(Arc::new(MemoryStorage::new()), None);
        sync.pull(PullTrigger::Startup).await.unwrap();
        assert!(sync.is_ready());
        assert_eq!(sync.status(), SyncState::Idle);
    }
}
