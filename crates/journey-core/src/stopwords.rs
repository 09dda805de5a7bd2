//! Stopword / name-exclusion configuration for the word-frequency ranker.
//!
//! The list is a JSON object mapping each token to whether it is excluded:
//!
//! ```json
//! { "the": true, "kelly": true, "housing": false }
//! ```
//!
//! Entries mapped to `false` are ignored, which lets a site override file
//! re-admit a token without deleting the line. Matching is exact and
//! case-sensitive; the ranker lower-cases its tokens before lookup.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::debug;

use crate::error::{JourneyError, Result};

/// Built-in exclusion list: English function words, client names and log
/// noise words.
const BUILTIN_STOPWORDS: &str = include_str!("../data/stopwords.json");

/// Set of tokens removed before ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopwordSet {
    words: HashSet<String>,
}

impl StopwordSet {
    /// The list shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_STOPWORDS)
    }

    /// Parse a `{ token: excluded }` JSON mapping.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mapping: HashMap<String, bool> = serde_json::from_str(json)?;
        Ok(Self {
            words: mapping
                .into_iter()
                .filter_map(|(token, excluded)| excluded.then_some(token))
                .collect(),
        })
    }

    /// Load a mapping file from disk.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| JourneyError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let set = Self::from_json_str(&content)?;
        debug!("loaded {} stopwords from {}", set.len(), path.display());
        Ok(set)
    }

    /// Build a set directly from tokens.
    pub fn from_words<S: Into<String>>(words: impl IntoIterator<Item = S>) -> Self {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
