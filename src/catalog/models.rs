//! Data models for the word-set catalog

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of drill a word set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Phonics chunks ("-ight" family)
    Chunk,
    Collocation,
    /// Short sentences
    Sentence,
    /// Consonant-vowel-consonant warm-up
    Cvc,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Chunk => "chunk",
            Mode::Collocation => "collocation",
            Mode::Sentence => "sentence",
            Mode::Cvc => "cvc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Chunk => "Phonics Chunks",
            Mode::Collocation => "Collocations",
            Mode::Sentence => "Short Sentences",
            Mode::Cvc => "CVC Warm-up",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chunk" => Ok(Mode::Chunk),
            "collocation" => Ok(Mode::Collocation),
            "sentence" => Ok(Mode::Sentence),
            "cvc" => Ok(Mode::Cvc),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// Who a word set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Owner {
    Child,
    Parent,
    /// Visible to both accounts; only the parent may change it
    #[default]
    Shared,
}

impl Owner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Owner::Child => "child",
            Owner::Parent => "parent",
            Owner::Shared => "shared",
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Owner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "child" => Ok(Owner::Child),
            "parent" => Ok(Owner::Parent),
            "shared" => Ok(Owner::Shared),
            other => Err(format!("unknown owner '{}'", other)),
        }
    }
}

/// One of the two accounts sharing a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Account {
    #[default]
    Child,
    Parent,
}

impl Account {
    pub const ALL: [Account; 2] = [Account::Child, Account::Parent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Account::Child => "child",
            Account::Parent => "parent",
        }
    }

    pub fn is_parent(&self) -> bool {
        matches!(self, Account::Parent)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Account {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "child" => Ok(Account::Child),
            "parent" => Ok(Account::Parent),
            other => Err(format!("unknown account '{}'", other)),
        }
    }
}

/// Highest priority a set can carry
pub const MAX_PRIORITY: u8 = 3;

/// Priority override value marking a seed set as deleted
pub const DELETED_PRIORITY: i32 = -1;

fn default_priority() -> u8 {
    1
}

/// An immutable group of items flashed together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordSet {
    pub id: String,
    #[serde(alias = "level")]
    pub mode: Mode,
    #[serde(default)]
    pub owner: Owner,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// 0..=3, higher is more important
    #[serde(alias = "importance", default = "default_priority")]
    pub priority: u8,
    pub items: Vec<String>,
}

impl WordSet {
    pub fn new(id: String, mode: Mode, owner: Owner, label: String, priority: u8, items: Vec<String>) -> Self {
        Self {
            id,
            mode,
            owner,
            label,
            note: None,
            priority: priority.min(MAX_PRIORITY),
            items,
        }
    }

    /// Label for display, falling back to the note and then the first items
    pub fn display_label(&self) -> String {
        if !self.label.is_empty() {
            return self.label.clone();
        }
        if let Some(note) = self.note.as_ref().filter(|n| !n.is_empty()) {
            return note.clone();
        }
        self.items.iter().take(2).cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Input for authoring a custom set
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWordSet {
    pub mode: Mode,
    #[serde(default)]
    pub owner: Owner,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: u8,
    pub items: Vec<String>,
}
