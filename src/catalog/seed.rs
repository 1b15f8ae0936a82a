//! Built-in seed catalog and normalisation of raw source rows
//!
//! Two row shapes are accepted:
//! - grouped sets (`{id, mode, items, ...}`), taken as-is
//! - flat phrase rows (`{words, category, importance}`), grouped by category

use serde_json::Value;

use super::models::{Mode, Owner, WordSet, MAX_PRIORITY};

const WORDS_DATASET: &str = include_str!("../../data/words.json");
const COLLOCATIONS_DATASET: &str = include_str!("../../data/collocations.json");

/// Dataset keys shipped with the binary
pub const DATASET_KEYS: [&str; 2] = ["words", "collocations"];

const DEFAULT_CATEGORY: &str = "Collocations";

/// Load and normalise one of the embedded datasets.
///
/// An unknown key or an unparsable embedded file yields an empty catalog.
pub fn builtin_dataset(key: &str) -> Vec<WordSet> {
    let raw = match key {
        "words" => WORDS_DATASET,
        "collocations" => COLLOCATIONS_DATASET,
        other => {
            log::warn!("unknown seed dataset '{}'", other);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(rows) => normalize_source_sets(key, &rows),
        Err(e) => {
            log::error!("embedded dataset '{}' is not valid JSON: {}", key, e);
            Vec::new()
        }
    }
}

/// Map a star string ("★★") to a 0..=3 priority
pub fn importance_to_priority(raw: &Value) -> u8 {
    let Some(text) = raw.as_str() else {
        return 1;
    };
    let stars = text.chars().filter(|c| *c == '★').count();
    let stars = if stars == 0 { 1 } else { stars };
    stars.min(MAX_PRIORITY as usize) as u8
}

/// Normalise raw seed rows into word sets
pub fn normalize_source_sets(source_key: &str, source: &Value) -> Vec<WordSet> {
    let Some(rows) = source.as_array() else {
        return Vec::new();
    };

    let is_flat = !rows.is_empty()
        && rows
            .iter()
            .all(|row| row.get("words").map_or(false, Value::is_string));

    if is_flat {
        group_flat_rows(source_key, rows)
    } else {
        rows.iter().filter_map(parse_grouped_row).collect()
    }
}

fn parse_grouped_row(row: &Value) -> Option<WordSet> {
    if !row.get("items").map_or(false, Value::is_array) {
        log::debug!("dropping seed row without items: {}", row);
        return None;
    }
    match serde_json::from_value::<WordSet>(row.clone()) {
        Ok(mut set) => {
            set.priority = set.priority.min(MAX_PRIORITY);
            Some(set)
        }
        Err(e) => {
            log::debug!("dropping malformed seed row: {}", e);
            None
        }
    }
}

fn group_flat_rows(source_key: &str, rows: &[Value]) -> Vec<WordSet> {
    // (category, phrases, priority) in first-seen order
    let mut groups: Vec<(String, Vec<String>, u8)> = Vec::new();

    for row in rows {
        let phrase = row.get("words").and_then(Value::as_str).unwrap_or("").trim();
        if phrase.is_empty() {
            continue;
        }
        let category = row
            .get("category")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string();
        let priority = importance_to_priority(row.get("importance").unwrap_or(&Value::Null));

        match groups.iter_mut().find(|(name, _, _)| *name == category) {
            Some((_, phrases, max)) => {
                phrases.push(phrase.to_string());
                *max = (*max).max(priority);
            }
            None => groups.push((category, vec![phrase.to_string()], priority.max(1))),
        }
    }

    groups
        .into_iter()
        .enumerate()
        .map(|(i, (category, phrases, priority))| {
            WordSet::new(
                format!("{}_col_{:02}", source_key, i + 1),
                Mode::Collocation,
                Owner::Child,
                category,
                priority,
                phrases,
            )
        })
        .collect()
}
