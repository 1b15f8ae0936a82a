use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use super::models::{Account, NewWordSet, Owner, WordSet, DELETED_PRIORITY, MAX_PRIORITY};

#[derive(Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("Only the parent account can {action} {owner} sets")]
    Unauthorized { action: &'static str, owner: Owner },

    #[error("Word set not found: {0}")]
    SetNotFound(String),

    #[error("Invalid word set: {0}")]
    InvalidSet(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Priority overrides keyed by seed set id
pub type PriorityOverrides = HashMap<String, i32>;

/// Merge seed sets, priority overrides and custom sets into one list.
///
/// An override replaces the seed priority; a negative override removes the
/// set. Custom sets are appended unchanged after every seed set.
pub fn resolve(seed_sets: &[WordSet], overrides: &PriorityOverrides, custom_sets: &[WordSet]) -> Vec<WordSet> {
    let mut resolved: Vec<WordSet> = seed_sets
        .iter()
        .filter_map(|set| {
            let priority = overrides.get(&set.id).copied().unwrap_or(set.priority as i32);
            if priority < 0 {
                return None;
            }
            let mut set = set.clone();
            set.priority = priority.min(MAX_PRIORITY as i32) as u8;
            Some(set)
        })
        .collect();

    resolved.extend(custom_sets.iter().cloned());
    resolved
}

/// Shared sets may only be written by the parent account
pub fn authorize(owner: Owner, account: Account, action: &'static str) -> Result<()> {
    if owner == Owner::Shared && !account.is_parent() {
        return Err(CatalogError::Unauthorized { action, owner });
    }
    Ok(())
}

/// Validate an authored set and give it a fresh id
pub fn build_custom_set(input: NewWordSet, account: Account) -> Result<WordSet> {
    authorize(input.owner, account, "add")?;

    let items: Vec<String> = input
        .items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    if items.len() < 2 {
        return Err(CatalogError::InvalidSet(format!(
            "a set needs at least 2 items, got {}",
            items.len()
        )));
    }
    if input.priority > MAX_PRIORITY {
        return Err(CatalogError::InvalidSet(format!(
            "priority must be between 0 and {}",
            MAX_PRIORITY
        )));
    }

    let id = format!("custom_{}", Uuid::new_v4().simple());
    let mut set = WordSet::new(id, input.mode, input.owner, input.label.trim().to_string(), input.priority, items);
    set.note = input.note.filter(|n| !n.trim().is_empty());
    Ok(set)
}

/// How a delete has to be written back
#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    /// Seed sets are hidden with a -1 override
    Override { id: String },
    /// Custom sets are dropped from the custom bucket
    Custom { id: String },
}

/// Decide how to delete a set, enforcing the shared-set rule
pub fn plan_removal(set: &WordSet, seed_sets: &[WordSet], account: Account) -> Result<Removal> {
    authorize(set.owner, account, "delete")?;

    if seed_sets.iter().any(|s| s.id == set.id) {
        Ok(Removal::Override { id: set.id.clone() })
    } else {
        Ok(Removal::Custom { id: set.id.clone() })
    }
}

/// Apply a removal to the override bucket
pub fn apply_override_removal(mut overrides: PriorityOverrides, id: &str) -> PriorityOverrides {
    overrides.insert(id.to_string(), DELETED_PRIORITY);
    overrides
}

/// Apply a removal to the custom bucket
pub fn apply_custom_removal(custom: Vec<WordSet>, id: &str) -> Vec<WordSet> {
    custom.into_iter().filter(|s| s.id != id).collect()
}

/// Check a priority change before it is written as an override
pub fn validate_priority_change(set: &WordSet, priority: u8, account: Account) -> Result<()> {
    authorize(set.owner, account, "re-prioritise")?;
    if priority > MAX_PRIORITY {
        return Err(CatalogError::InvalidSet(format!(
            "priority must be between 0 and {}",
            MAX_PRIORITY
        )));
    }
    Ok(())
}
