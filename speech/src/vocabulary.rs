//! Tile vocabulary consumed by the preloader.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::VocabularyError;

/// Id prefixes of tiles that open a folder or navigate instead of speaking.
pub const NAVIGATION_PREFIXES: [&str; 2] = ["folder_", "nav_"];

/// One pictorial or textual unit on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_to_speak: Option<String>,
}

impl Tile {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            text_to_speak: None,
        }
    }

    pub fn with_text_to_speak(mut self, text: impl Into<String>) -> Self {
        self.text_to_speak = Some(text.into());
        self
    }

    /// Returns `text_to_speak` if present, else the label.
    pub fn spoken_text(&self) -> &str {
        self.text_to_speak.as_deref().unwrap_or(&self.label)
    }

    /// Returns true for folder and navigation tiles.
    pub fn is_navigation(&self) -> bool {
        NAVIGATION_PREFIXES.iter().any(|p| self.id.starts_with(p))
    }
}

/// Category name to ordered tiles.
pub type Vocabulary = BTreeMap<String, Vec<Tile>>;

/// Reads a vocabulary from a JSON file.
pub fn load_vocabulary(path: impl AsRef<Path>) -> Result<Vocabulary, VocabularyError> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Returns the unique spoken strings of every speakable tile, in first-seen
/// order.
///
/// Strings are returned exactly as [`Tile::spoken_text`] gives them so they
/// key the cache the same way speaking the tile does. Blank strings are
/// skipped.
pub fn speakable_texts(vocabulary: &Vocabulary) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for tile in vocabulary.values().flatten() {
        if tile.is_navigation() {
            continue;
        }
        let text = tile.spoken_text();
        if text.trim().is_empty() {
            continue;
        }
        if seen.insert(text) {
            out.push(text.to_string());
        }
    }
    out
}
