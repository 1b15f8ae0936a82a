//! Spaced repetition scheduling for word sets
//!
//! This module provides:
//! - Review state and session record models
//! - The level rule and the interval (ease factor) rule
//! - Pool filtering and queue selection
//! - Selectable scheduling policies

pub mod algorithm;
pub mod models;
pub mod policy;
pub mod scheduler;

pub use models::*;
pub use policy::{IntervalPolicy, LevelPolicy, PolicyKind, SchedulingPolicy};
pub use scheduler::{Clock, FixedClock, PoolStats, SessionFilters, SystemClock};
