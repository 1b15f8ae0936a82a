//! Selectable scheduling strategies
//!
//! The level rule and the interval rule grew up in different parts of the
//! app and are kept apart on purpose: each pairs a grading transition with
//! its own queue selection.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::WordSet;

use super::algorithm::{due_for_level, next_level, score_ratio, update_record};
use super::models::{ReviewState, ReviewStateMap};
use super::scheduler::{build_queue, select_session_sets};

/// Grading plus queue selection
pub trait SchedulingPolicy: Send + Sync {
    fn kind(&self) -> PolicyKind;

    /// New state of a set after `correct` of `total` items were recalled
    fn grade(&self, prev: Option<&ReviewState>, correct: u32, total: u32, now: DateTime<Utc>) -> ReviewState;

    /// Ordered sets for the next session
    fn select(
        &self,
        pool: &[WordSet],
        states: &ReviewStateMap,
        importance_filter: &[u8],
        count: usize,
        now: DateTime<Utc>,
    ) -> Vec<WordSet>;
}

/// Which strategy to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Level 0..=4 with the fixed day table, urgency-ordered queue
    #[default]
    Level,
    /// Interval and ease factor, importance-weighted selection
    Interval,
}

impl PolicyKind {
    pub fn build(self) -> Box<dyn SchedulingPolicy> {
        match self {
            PolicyKind::Level => Box::new(LevelPolicy),
            PolicyKind::Interval => Box::new(IntervalPolicy),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Level => f.write_str("level"),
            PolicyKind::Interval => f.write_str("interval"),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "level" => Ok(PolicyKind::Level),
            "interval" => Ok(PolicyKind::Interval),
            other => Err(format!("unknown policy '{}'", other)),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LevelPolicy;

impl SchedulingPolicy for LevelPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Level
    }

    fn grade(&self, prev: Option<&ReviewState>, correct: u32, total: u32, now: DateTime<Utc>) -> ReviewState {
        let today = now.date_naive();
        let mut state = prev.cloned().unwrap_or_default();

        let level = next_level(state.level, score_ratio(correct, total));
        state.level = level;
        state.due = Some(due_for_level(level, today));
        state.last_seen = Some(today);
        // The day table owns the due date now
        state.next_due = None;
        state.record_round(correct, total);
        state
    }

    fn select(
        &self,
        pool: &[WordSet],
        states: &ReviewStateMap,
        _importance_filter: &[u8],
        count: usize,
        now: DateTime<Utc>,
    ) -> Vec<WordSet> {
        build_queue(pool, states, count, now.date_naive())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IntervalPolicy;

impl SchedulingPolicy for IntervalPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Interval
    }

    fn grade(&self, prev: Option<&ReviewState>, correct: u32, total: u32, now: DateTime<Utc>) -> ReviewState {
        update_record(prev, correct, total, now)
    }

    fn select(
        &self,
        pool: &[WordSet],
        states: &ReviewStateMap,
        importance_filter: &[u8],
        count: usize,
        now: DateTime<Utc>,
    ) -> Vec<WordSet> {
        select_session_sets(pool, states, importance_filter, count, now)
    }
}
