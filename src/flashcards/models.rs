//! Data models for review state and session history

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Mode;

/// Spaced repetition state for one word set, per account.
///
/// The level policy fills `level`/`due`/`last_seen`; the interval policy
/// fills `interval`/`ease_factor`/`next_due` and keeps `due` in step with
/// `next_due`. Both maintain the cumulative totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    /// Maturity level 0..=4
    #[serde(default)]
    pub level: u8,
    /// Next review date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<NaiveDate>,
    /// Interval in days (interval policy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    /// Ease factor 1.3..=2.5 (interval policy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease_factor: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub last_studied: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub next_due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_sessions: u32,
    #[serde(default)]
    pub total_correct: u32,
    #[serde(default)]
    pub total_items: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_score: Option<f64>,
}

impl ReviewState {
    /// Fold one graded round into the cumulative totals
    pub fn record_round(&mut self, correct: u32, total: u32) {
        self.total_sessions += 1;
        self.total_correct += correct;
        self.total_items += total;
    }
}

/// Review state of every seen set, keyed by set id
pub type ReviewStateMap = HashMap<String, ReviewState>;

/// Aggregate of one finished session for one mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub date: NaiveDate,
    pub mode: Mode,
    /// Number of sets studied
    pub sets: u32,
    /// Items recalled
    pub correct: u32,
    /// Items shown
    #[serde(alias = "total")]
    pub words: u32,
}

/// Records older than this many days are dropped on write
pub const RECORD_RETENTION_DAYS: i64 = 365;

/// Drop records outside the retention window, then append the new ones
pub fn append_records(
    existing: Vec<SessionRecord>,
    new_records: Vec<SessionRecord>,
    today: NaiveDate,
) -> Vec<SessionRecord> {
    let cutoff = today - chrono::Duration::days(RECORD_RETENTION_DAYS);
    let mut records: Vec<SessionRecord> = existing.into_iter().filter(|r| r.date > cutoff).collect();
    records.extend(new_records);
    records
}
