//! Pool filtering and session queue selection

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Mode, Owner, WordSet};

use super::algorithm::{days_since_due, is_due};
use super::models::ReviewStateMap;

/// Source of "now" for everything time dependent
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Filters chosen on the home screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFilters {
    /// Sets below this priority are left out
    pub min_priority: u8,
    /// `None` matches every mode
    #[serde(default)]
    pub mode: Option<Mode>,
    /// `None` matches every owner
    #[serde(default)]
    pub owner: Option<Owner>,
    /// Allowed priorities for importance-weighted selection; empty allows all
    #[serde(default)]
    pub importance: Vec<u8>,
}

impl Default for SessionFilters {
    fn default() -> Self {
        Self {
            min_priority: 3,
            mode: None,
            owner: None,
            importance: Vec::new(),
        }
    }
}

/// Keep the sets matching every filter
pub fn filter_pool(sets: &[WordSet], filters: &SessionFilters) -> Vec<WordSet> {
    sets.iter()
        .filter(|s| s.priority >= filters.min_priority)
        .filter(|s| filters.mode.map_or(true, |m| s.mode == m))
        .filter(|s| filters.owner.map_or(true, |o| s.owner == o))
        .cloned()
        .collect()
}

/// Order a pool by urgency and take the first `count`.
///
/// Sort key is (urgency, level, due): due or unseen sets first, then the
/// least mature, then the earliest due date. Unseen sets have no due date
/// and sort before every dated set. The sort is stable, so ties keep the
/// pool order.
pub fn build_queue(pool: &[WordSet], states: &ReviewStateMap, count: usize, today: NaiveDate) -> Vec<WordSet> {
    let mut keyed: Vec<(u8, u8, Option<NaiveDate>, &WordSet)> = pool
        .iter()
        .map(|set| {
            let (level, due) = states
                .get(&set.id)
                .map(|st| (st.level, st.due))
                .unwrap_or((0, None));
            let urgency = if due.map_or(true, |d| d <= today) { 0 } else { 1 };
            (urgency, level, due, set)
        })
        .collect();

    keyed.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

    keyed.into_iter().take(count).map(|(_, _, _, set)| set.clone()).collect()
}

/// Selection weight of a priority
pub fn importance_score(priority: u8) -> f64 {
    match priority {
        3 => 5.0,
        2 => 3.0,
        1 => 1.0,
        _ => 0.0,
    }
}

/// Days-since-due used for sets graded by the level rule, which have no timestamp
const UNKNOWN_DAYS_SINCE_DUE: f64 = 999.0;

/// Importance-weighted selection for the interval rule.
///
/// Never-studied sets score 1000 + 10 * weight, due sets 500 + 10 * weight +
/// days overdue, and sets not yet due only their weight. Highest score first;
/// equal scores keep input order.
pub fn select_session_sets(
    sets: &[WordSet],
    states: &ReviewStateMap,
    importance_filter: &[u8],
    max_sets: usize,
    now: DateTime<Utc>,
) -> Vec<WordSet> {
    let mut scored: Vec<(f64, &WordSet)> = sets
        .iter()
        .filter(|ws| importance_filter.is_empty() || importance_filter.contains(&ws.priority))
        .map(|ws| {
            let weight = importance_score(ws.priority);
            let score = match states.get(&ws.id) {
                None => 1000.0 + weight * 10.0,
                Some(state) if is_due(Some(state), now) => {
                    let overdue = days_since_due(state, now).unwrap_or(UNKNOWN_DAYS_SINCE_DUE);
                    500.0 + weight * 10.0 + overdue
                }
                Some(_) => weight,
            };
            (score, ws)
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    scored.into_iter().take(max_sets).map(|(_, ws)| ws.clone()).collect()
}

/// Due and unseen counts for a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PoolStats {
    pub due: usize,
    pub unseen: usize,
}

pub fn pool_stats(pool: &[WordSet], states: &ReviewStateMap, today: NaiveDate) -> PoolStats {
    let mut stats = PoolStats::default();
    for set in pool {
        match states.get(&set.id) {
            None => {
                stats.unseen += 1;
                stats.due += 1;
            }
            Some(state) => {
                if state.due.map_or(true, |d| d <= today) {
                    stats.due += 1;
                }
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::models::ReviewState;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    fn set(id: &str, priority: u8) -> WordSet {
        WordSet::new(
            id.to_string(),
            Mode::Chunk,
            Owner::Child,
            id.to_string(),
            priority,
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        )
    }

    fn level_state(level: u8, due_in_days: i64) -> ReviewState {
        ReviewState {
            level,
            due: Some(now().date_naive() + Duration::days(due_in_days)),
            ..Default::default()
        }
    }

    #[test]
    fn test_filter_pool() {
        let mut a = set("a", 3);
        a.mode = Mode::Sentence;
        let b = set("b", 2);
        let mut c = set("c", 3);
        c.owner = Owner::Shared;
        let sets = vec![a, b, c];

        let filters = SessionFilters { min_priority: 3, ..Default::default() };
        let ids: Vec<String> = filter_pool(&sets, &filters).into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["a", "c"]);

        let filters = SessionFilters {
            min_priority: 0,
            mode: Some(Mode::Chunk),
            owner: Some(Owner::Child),
            importance: Vec::new(),
        };
        let ids: Vec<String> = filter_pool(&sets, &filters).into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_build_queue_unseen_keeps_order() {
        let pool: Vec<WordSet> = (1..=5).map(|i| set(&format!("s{}", i), 3)).collect();
        let queue = build_queue(&pool, &ReviewStateMap::new(), 5, now().date_naive());
        assert_eq!(queue, pool);
    }

    #[test]
    fn test_build_queue_ordering() {
        let pool = vec![set("future", 3), set("due_l2", 3), set("unseen", 3), set("due_l0_late", 3), set("due_l0_early", 3)];
        let mut states = ReviewStateMap::new();
        states.insert("future".to_string(), level_state(0, 3));
        states.insert("due_l2".to_string(), level_state(2, 0));
        states.insert("due_l0_late".to_string(), level_state(0, -1));
        states.insert("due_l0_early".to_string(), level_state(0, -5));

        let queue = build_queue(&pool, &states, 10, now().date_naive());
        let ids: Vec<&str> = queue.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["unseen", "due_l0_early", "due_l0_late", "due_l2", "future"]);
    }

    #[test]
    fn test_build_queue_truncates_and_is_deterministic() {
        let pool: Vec<WordSet> = (1..=8).map(|i| set(&format!("s{}", i), 3)).collect();
        let mut states = ReviewStateMap::new();
        states.insert("s1".to_string(), level_state(1, 2));
        states.insert("s4".to_string(), level_state(3, -2));

        let first = build_queue(&pool, &states, 5, now().date_naive());
        let second = build_queue(&pool, &states, 5, now().date_naive());
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
        assert!(first.iter().all(|s| s.id != "s1"));
    }

    #[test]
    fn test_unseen_before_future() {
        let pool = vec![set("future", 3), set("unseen", 3)];
        let mut states = ReviewStateMap::new();
        states.insert("future".to_string(), level_state(0, 1));

        let queue = build_queue(&pool, &states, 2, now().date_naive());
        assert_eq!(queue[0].id, "unseen");
    }

    #[test]
    fn test_select_session_sets_scoring() {
        let sets = vec![set("low_new", 1), set("high_new", 3), set("due", 3), set("later", 3)];
        let mut states = ReviewStateMap::new();
        states.insert(
            "due".to_string(),
            ReviewState { next_due: Some(now() - Duration::days(2)), ..Default::default() },
        );
        states.insert(
            "later".to_string(),
            ReviewState { next_due: Some(now() + Duration::days(2)), ..Default::default() },
        );

        let selected = select_session_sets(&sets, &states, &[], 10, now());
        let ids: Vec<&str> = selected.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["high_new", "low_new", "due", "later"]);
    }

    #[test]
    fn test_select_session_sets_respects_filter_and_max() {
        let sets: Vec<WordSet> = (0..10).map(|i| set(&format!("s{}", i), (i % 4) as u8)).collect();

        let selected = select_session_sets(&sets, &ReviewStateMap::new(), &[2, 3], 3, now());
        assert_eq!(selected.len(), 3);
        assert!(selected.iter().all(|s| s.priority >= 2));

        let all = select_session_sets(&sets, &ReviewStateMap::new(), &[], 100, now());
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn test_select_session_sets_tie_keeps_input_order() {
        let sets = vec![set("x", 2), set("y", 2), set("z", 2)];
        let selected = select_session_sets(&sets, &ReviewStateMap::new(), &[], 3, now());
        let ids: Vec<&str> = selected.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_pool_stats() {
        let pool = vec![set("a", 3), set("b", 3), set("c", 3)];
        let mut states = ReviewStateMap::new();
        states.insert("a".to_string(), level_state(1, 1));
        states.insert("b".to_string(), level_state(1, 0));

        let stats = pool_stats(&pool, &states, now().date_naive());
        assert_eq!(stats, PoolStats { due: 2, unseen: 1 });
    }
}
