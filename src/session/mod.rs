//! Study session state machine
//!
//! A session walks its queue set by set: ready, flash (timed), recall,
//! result, and finally a summary with one record per mode.

mod runner;
mod timer;

use thiserror::Error;

pub use runner::{
    Advance, GradeBand, GradeOutcome, Phase, RoundResult, SessionRunner, SessionSummary, MIN_SET_ITEMS,
};
pub use timer::{FlashCountdown, DEFAULT_FLASH_GRACE};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No sets match the current filters")]
    EmptyPool,
    #[error("Set {id} has {items} items, at least 2 are needed")]
    SetTooSmall { id: String, items: usize },
    #[error("Session is in the {actual} phase, expected {expected}")]
    InvalidPhase { expected: Phase, actual: Phase },
    #[error("Recalled count {count} is larger than the set ({max} items)")]
    ScoreOutOfRange { count: u32, max: u32 },
    #[error("Session was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SessionError>;
