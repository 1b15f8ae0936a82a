//! Spaced repetition transitions
//!
//! Two independent rules live here:
//! - the level rule: a 0..=4 maturity counter mapped to a fixed day table
//! - the interval rule: a simplified SM-2 with an ease factor in 1.3..=2.5
//!
//! Scores are the recalled fraction of a set (0.0 = nothing, 1.0 = all).

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::models::ReviewState;

/// Days until the next review for each maturity level
pub const SRS_DAYS: [i64; 5] = [0, 1, 3, 7, 14];

/// Highest maturity level
pub const MAX_LEVEL: u8 = 4;

/// Minimum ease factor allowed
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Maximum ease factor allowed
pub const MAX_EASE_FACTOR: f64 = 2.5;

/// Ease factor of a set that has never been graded
pub const INITIAL_EASE_FACTOR: f64 = 2.0;

/// Longest interval the interval rule will schedule (about a century)
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Fraction of items recalled; an empty set scores 0
pub fn score_ratio(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64
}

/// Promote on a perfect round, hold at 75% or better, demote otherwise
pub fn next_level(prev: u8, ratio: f64) -> u8 {
    let prev = prev.min(MAX_LEVEL);
    if ratio >= 1.0 {
        (prev + 1).min(MAX_LEVEL)
    } else if ratio >= 0.75 {
        prev
    } else {
        prev.saturating_sub(1)
    }
}

/// Due date for a level, counted from `today`
pub fn due_for_level(level: u8, today: NaiveDate) -> NaiveDate {
    let idx = (level.min(MAX_LEVEL)) as usize;
    today + Duration::days(SRS_DAYS[idx])
}

/// Result of the interval rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalResult {
    pub interval: u32,
    pub ease_factor: f64,
}

/// Calculate the next interval and ease factor
pub fn calc_next_interval(interval: u32, ease_factor: f64, score: f64) -> IntervalResult {
    if score < 0.3 {
        return IntervalResult {
            interval: 1,
            ease_factor: (ease_factor - 0.2).max(MIN_EASE_FACTOR),
        };
    }
    if score < 0.6 {
        return IntervalResult {
            interval: ((interval as f64 * 0.8).floor() as u32).clamp(1, MAX_INTERVAL_DAYS),
            ease_factor: (ease_factor - 0.1).max(MIN_EASE_FACTOR),
        };
    }

    let ease_factor = (ease_factor + 0.1 * (score - 0.6)).min(MAX_EASE_FACTOR);
    let interval = match interval {
        0 => 1,
        1 => 3,
        n => (n as f64 * ease_factor).round().min(MAX_INTERVAL_DAYS as f64) as u32,
    };
    IntervalResult { interval, ease_factor }
}

/// Apply the interval rule to a set's state after a graded round
pub fn update_record(prev: Option<&ReviewState>, correct: u32, total: u32, now: DateTime<Utc>) -> ReviewState {
    let score = score_ratio(correct, total);
    let mut state = prev.cloned().unwrap_or_default();

    let IntervalResult { interval, ease_factor } = calc_next_interval(
        state.interval.unwrap_or(0),
        state.ease_factor.unwrap_or(INITIAL_EASE_FACTOR),
        score,
    );
    let next_due = now
        .checked_add_signed(Duration::days(interval as i64))
        .or_else(|| now.checked_add_signed(Duration::days(MAX_INTERVAL_DAYS as i64)))
        .unwrap_or(now);

    state.interval = Some(interval);
    state.ease_factor = Some(ease_factor);
    state.last_studied = Some(now);
    state.next_due = Some(next_due);
    state.due = Some(next_due.date_naive());
    state.last_score = Some(score);
    state.record_round(correct, total);
    state
}

/// Whether a set needs review at `now`.
///
/// Unseen sets are always due. Interval states compare the exact timestamp,
/// level states compare the calendar date.
pub fn is_due(state: Option<&ReviewState>, now: DateTime<Utc>) -> bool {
    let Some(state) = state else {
        return true;
    };
    match (state.next_due, state.due) {
        (Some(next_due), _) => now >= next_due,
        (None, Some(due)) => due <= now.date_naive(),
        (None, None) => true,
    }
}

/// Days elapsed since the set became due, as a fraction
pub fn days_since_due(state: &ReviewState, now: DateTime<Utc>) -> Option<f64> {
    let next_due = state.next_due?;
    let elapsed = (now - next_due).num_milliseconds().max(0) as f64;
    Some(elapsed / MS_PER_DAY)
}

/// Format the time until the next review
pub fn format_next_due(next_due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(next_due) = next_due else {
        return "now".to_string();
    };
    let diff = (next_due - now).num_milliseconds();
    if diff <= 0 {
        return "now".to_string();
    }
    let days = (diff as f64 / MS_PER_DAY).ceil() as i64;
    if days == 1 {
        "tomorrow".to_string()
    } else {
        format!("in {} days", days)
    }
}
