//! The study context: one object holding the catalog, the scheduling policy,
//! the sync manager and the clock for the running app.
//!
//! Built once at start-up and passed to whatever drives a session.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::catalog::resolver::{
    apply_custom_removal, apply_override_removal, authorize, build_custom_set, plan_removal,
    validate_priority_change,
};
use crate::catalog::seed::builtin_dataset;
use crate::catalog::{resolve, Account, CatalogError, Mode, NewWordSet, Owner, Removal, WordSet};
use crate::config::AppConfig;
use crate::flashcards::scheduler::{filter_pool, pool_stats};
use crate::flashcards::{Clock, PoolStats, SchedulingPolicy, SessionFilters, SessionRecord, SystemClock};
use crate::session::{Advance, GradeOutcome, SessionError, SessionRunner, SessionSummary};
use crate::stats::{dashboard_series, total_stats, DailyTotals, TotalStats};
use crate::storage::{FileStorage, LocalStore, StorageError};
use crate::sync::{PullTrigger, RemoteStore, SyncError, SyncManager, WebDAVError, WebDavRemote};

#[derive(Error, Debug)]
pub enum StudyError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Remote setup failed: {0}")]
    Remote(#[from] WebDAVError),
}

pub type Result<T> = std::result::Result<T, StudyError>;

pub struct StudyContext {
    config: AppConfig,
    sync: Arc<SyncManager>,
    policy: Box<dyn SchedulingPolicy>,
    clock: Arc<dyn Clock>,
    seed_sets: Vec<WordSet>,
}

impl StudyContext {
    pub fn new(
        config: AppConfig,
        local: Arc<dyn LocalStore>,
        remote: Option<Arc<dyn RemoteStore>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sync = SyncManager::new(local, remote, Arc::clone(&clock)).with_revert_delay(config.revert_delay());
        let seed_sets = builtin_dataset(&config.dataset);
        log::info!(
            "Loaded {} seed sets from dataset '{}', {} policy",
            seed_sets.len(),
            config.dataset,
            config.policy
        );

        Self {
            policy: config.policy.build(),
            config,
            sync: Arc::new(sync),
            clock,
            seed_sets,
        }
    }

    /// File-backed context under `data_dir`, with the WebDAV remote when configured
    pub fn open(config: AppConfig, data_dir: &Path) -> Result<Self> {
        let storage = FileStorage::new(data_dir.to_path_buf());
        storage.init()?;

        let remote: Option<Arc<dyn RemoteStore>> = match config.remote.as_ref() {
            Some(remote_config) => Some(Arc::new(WebDavRemote::new(remote_config)?)),
            None => None,
        };

        Ok(Self::new(config, Arc::new(storage), remote, Arc::new(SystemClock)))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sync(&self) -> &Arc<SyncManager> {
        &self.sync
    }

    pub fn policy(&self) -> &dyn SchedulingPolicy {
        self.policy.as_ref()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn account(&self) -> Account {
        self.sync.account()
    }

    /// First load; a failed pull leaves the app usable on local data
    pub async fn load(&self) {
        if let Err(e) = self.sync.pull(PullTrigger::Startup).await {
            log::warn!("Starting with local data: {}", e);
        }
    }

    /// Seed sets with overrides applied, then custom sets
    pub fn all_sets(&self) -> Vec<WordSet> {
        let snapshot = self.sync.snapshot();
        resolve(&self.seed_sets, &snapshot.overrides, &snapshot.custom_sets)
    }

    pub fn find_set(&self, id: &str) -> Result<WordSet> {
        self.all_sets()
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| CatalogError::SetNotFound(id.to_string()).into())
    }

    fn is_seed(&self, id: &str) -> bool {
        self.seed_sets.iter().any(|s| s.id == id)
    }

    /// Ordered sets for the next session under the active policy
    pub fn build_session_queue(&self, filters: &SessionFilters) -> Vec<WordSet> {
        let pool = filter_pool(&self.all_sets(), filters);
        self.policy.select(
            &pool,
            &self.sync.review_states(),
            &filters.importance,
            self.config.session_size,
            self.clock.now(),
        )
    }

    pub fn start_session(&self, filters: &SessionFilters) -> Result<SessionRunner> {
        let queue = self.build_session_queue(filters);
        let runner = SessionRunner::start(queue, self.config.flash_time)?.with_grace(self.config.flash_grace());
        Ok(runner)
    }

    /// Grade the runner's current set and persist the new review state
    pub async fn grade_current_set(&self, runner: &mut SessionRunner, count: u32) -> Result<GradeOutcome> {
        let prev = runner
            .current()
            .and_then(|set| self.sync.review_states().get(&set.id).cloned());
        let outcome = runner.submit_score(count, self.policy.as_ref(), prev.as_ref(), self.clock.now())?;

        let set_id = outcome.set_id.clone();
        let state = outcome.review_state.clone();
        self.sync
            .update_review_states(move |mut states| {
                states.insert(set_id, state);
                states
            })
            .await;
        Ok(outcome)
    }

    /// Move past a graded round; a finished session writes its records
    pub async fn advance_queue(&self, runner: &mut SessionRunner) -> Result<Advance> {
        let advance = runner.advance(self.clock.today())?;
        if let Advance::Complete(summary) = &advance {
            self.sync.append_session_records(summary.records.clone()).await;
        }
        Ok(advance)
    }

    /// Finish after the current round and write the records of what was graded
    pub async fn finish_session(&self, runner: &mut SessionRunner) -> Result<SessionSummary> {
        let summary = runner.finish_early(self.clock.today())?;
        self.sync.append_session_records(summary.records.clone()).await;
        Ok(summary)
    }

    pub async fn add_custom_set(&self, input: NewWordSet) -> Result<WordSet> {
        let set = build_custom_set(input, self.account())?;
        let added = set.clone();
        self.sync
            .update_custom_sets(move |mut sets| {
                if !sets.iter().any(|s| s.id == added.id) {
                    sets.push(added.clone());
                }
                sets
            })
            .await;
        log::info!("Added custom set {}", set.id);
        Ok(set)
    }

    /// Hide a seed set with an override, or drop a custom set
    pub async fn delete_set(&self, id: &str) -> Result<()> {
        let set = self.find_set(id)?;
        match plan_removal(&set, &self.seed_sets, self.account())? {
            Removal::Override { id } => {
                self.sync
                    .update_overrides(|overrides| apply_override_removal(overrides, &id))
                    .await;
            }
            Removal::Custom { id } => {
                self.sync
                    .update_custom_sets(|sets| apply_custom_removal(sets, &id))
                    .await;
            }
        }
        log::info!("Deleted set {}", id);
        Ok(())
    }

    pub async fn update_priority(&self, id: &str, priority: u8) -> Result<()> {
        let set = self.find_set(id)?;
        validate_priority_change(&set, priority, self.account())?;

        if self.is_seed(id) {
            self.sync
                .update_overrides(|mut overrides| {
                    overrides.insert(id.to_string(), i32::from(priority));
                    overrides
                })
                .await;
        } else {
            self.sync
                .update_custom_sets(|mut sets| {
                    if let Some(custom) = sets.iter_mut().find(|s| s.id == id) {
                        custom.priority = priority;
                    }
                    sets
                })
                .await;
        }
        Ok(())
    }

    /// Drop every seed priority override; custom sets stay
    pub async fn reset_priorities(&self) -> Result<()> {
        authorize(Owner::Shared, self.account(), "reset")?;
        self.sync.update_overrides(|_| Default::default()).await;
        Ok(())
    }

    /// Bulk reset of the active account's review state
    pub async fn reset_review_states(&self) -> Result<()> {
        authorize(Owner::Shared, self.account(), "reset")?;
        self.sync.update_review_states(|_| Default::default()).await;
        Ok(())
    }

    /// Empty the records of `account`; parent only
    pub async fn reset_records(&self, account: Account) -> Result<()> {
        authorize(Owner::Shared, self.account(), "reset")?;
        self.sync.clear_records(account).await;
        Ok(())
    }

    pub fn switch_account(&self, account: Account) {
        self.sync.switch_account(account);
    }

    pub fn pool_stats(&self, filters: &SessionFilters) -> PoolStats {
        let pool = filter_pool(&self.all_sets(), filters);
        pool_stats(&pool, &self.sync.review_states(), self.clock.today())
    }

    pub fn records(&self, account: Account) -> Vec<SessionRecord> {
        self.sync.records_for(account)
    }

    pub fn dashboard_series(&self, account: Account, mode: Option<Mode>) -> Vec<DailyTotals> {
        dashboard_series(&self.records(account), mode)
    }

    pub fn total_stats(&self, account: Account, mode: Option<Mode>) -> TotalStats {
        total_stats(&self.records(account), mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::{FixedClock, PolicyKind};
    use crate::storage::MemoryStorage;
    use crate::sync::{MemoryRemote, SyncState};
    use chrono::{TimeZone, Utc};

    fn context_with(remote: Option<Arc<MemoryRemote>>, policy: PolicyKind) -> StudyContext {
        let config = AppConfig {
            policy,
            ..AppConfig::default()
        };
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()));
        let remote = remote.map(|r| r as Arc<dyn RemoteStore>);
        StudyContext::new(config, Arc::new(MemoryStorage::new()), remote, clock)
    }

    fn context() -> StudyContext {
        context_with(None, PolicyKind::Level)
    }

    fn all_filters() -> SessionFilters {
        SessionFilters {
            min_priority: 0,
            ..SessionFilters::default()
        }
    }

    fn new_set(owner: Owner) -> NewWordSet {
        NewWordSet {
            mode: Mode::Chunk,
            owner,
            label: "Kitchen".to_string(),
            note: None,
            priority: 3,
            items: vec!["a cup of tea".to_string(), "wash the dishes".to_string()],
        }
    }

    #[tokio::test]
    async fn test_queue_is_capped_at_session_size() {
        let ctx = context();
        ctx.load().await;
        let queue = ctx.build_session_queue(&all_filters());
        assert_eq!(queue.len(), 5);

        let first_unseen: Vec<String> = ctx.all_sets().into_iter().take(5).map(|s| s.id).collect();
        let ids: Vec<String> = queue.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, first_unseen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_persists_review_state_and_records() {
        let ctx = context();
        ctx.load().await;
        let mut runner = ctx.start_session(&all_filters()).unwrap();

        loop {
            runner.run_flash(|_| {}).await.unwrap();
            let total = runner.current().unwrap().items.len() as u32;
            let outcome = ctx.grade_current_set(&mut runner, total).await.unwrap();
            assert_eq!(outcome.percentage, 100);
            if let Advance::Complete(summary) = ctx.advance_queue(&mut runner).await.unwrap() {
                assert_eq!(summary.percentage, 100);
                break;
            }
        }

        let states = ctx.sync().review_states();
        assert_eq!(states.len(), 5);
        assert!(states.values().all(|s| s.level == 1));
        let series = ctx.dashboard_series(Account::Child, None);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].sets, 5);
        assert!(ctx.records(Account::Parent).is_empty());
    }

    #[tokio::test]
    async fn test_start_session_refuses_empty_pool() {
        let ctx = context();
        ctx.load().await;
        // Parent-owned seed sets all sit below priority 3
        let filters = SessionFilters {
            owner: Some(Owner::Parent),
            ..SessionFilters::default()
        };
        assert!(matches!(
            ctx.start_session(&filters),
            Err(StudyError::Session(SessionError::EmptyPool))
        ));
    }

    #[tokio::test]
    async fn test_child_cannot_touch_shared_sets() {
        let ctx = context();
        ctx.load().await;
        assert_eq!(ctx.account(), Account::Child);

        let err = ctx.add_custom_set(new_set(Owner::Shared)).await.unwrap_err();
        assert!(matches!(err, StudyError::Catalog(CatalogError::Unauthorized { .. })));

        let shared = ctx.all_sets().into_iter().find(|s| s.owner == Owner::Shared).unwrap();
        assert!(ctx.delete_set(&shared.id).await.is_err());
        assert!(ctx.update_priority(&shared.id, 0).await.is_err());
        assert!(ctx.reset_priorities().await.is_err());
        assert!(ctx.all_sets().iter().any(|s| s.id == shared.id));
    }

    #[tokio::test]
    async fn test_parent_deletes_seed_and_custom_sets() {
        let ctx = context();
        ctx.load().await;
        ctx.switch_account(Account::Parent);

        let custom = ctx.add_custom_set(new_set(Owner::Shared)).await.unwrap();
        assert!(ctx.find_set(&custom.id).is_ok());

        let seed = ctx.all_sets()[0].clone();
        ctx.delete_set(&seed.id).await.unwrap();
        ctx.delete_set(&custom.id).await.unwrap();

        assert!(ctx.find_set(&seed.id).is_err());
        assert!(ctx.find_set(&custom.id).is_err());
        assert_eq!(ctx.sync().overrides().get(&seed.id), Some(&-1));

        ctx.reset_priorities().await.unwrap();
        assert!(ctx.find_set(&seed.id).is_ok());
    }

    #[tokio::test]
    async fn test_update_priority_for_seed_and_custom() {
        let ctx = context();
        ctx.load().await;
        ctx.switch_account(Account::Parent);

        let seed = ctx.all_sets()[0].clone();
        ctx.update_priority(&seed.id, 1).await.unwrap();
        assert_eq!(ctx.find_set(&seed.id).unwrap().priority, 1);

        let custom = ctx.add_custom_set(new_set(Owner::Child)).await.unwrap();
        ctx.update_priority(&custom.id, 0).await.unwrap();
        assert_eq!(ctx.find_set(&custom.id).unwrap().priority, 0);
        assert!(ctx.sync().overrides().get(&custom.id).is_none());
    }

    #[tokio::test]
    async fn test_offline_remote_still_allows_study() {
        let remote = Arc::new(MemoryRemote::new());
        remote.set_offline(true);
        let ctx = context_with(Some(remote), PolicyKind::Interval);
        ctx.load().await;
        assert_eq!(ctx.sync().status(), SyncState::Error);
        assert!(ctx.sync().is_ready());

        let stats = ctx.pool_stats(&all_filters());
        assert_eq!(stats.unseen, ctx.all_sets().len());
        assert!(ctx.start_session(&all_filters()).is_ok());
    }
}
