//! Word-set catalog
//!
//! This module provides:
//! - The word-set, owner and account models
//! - Seed catalog loading and normalisation
//! - The seed + override + custom merge
//! - Authorization of writes to shared sets

pub mod models;
pub mod resolver;
pub mod seed;

pub use models::*;
pub use resolver::{resolve, CatalogError, PriorityOverrides, Removal};
