//! Text matcher compiled from a search query.
//!
//! - `Substring`: case-insensitive substring test.
//! - `Fuzzy`: each pair of consecutive query characters may be separated by
//!   up to `max_gap` arbitrary characters (`"ab"` → `a.{0,2}b`).

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{GuestListError, Result};

/// Gap allowed between query characters in fuzzy mode.
pub const DEFAULT_MAX_GAP: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Substring,
    Fuzzy,
}

#[derive(Debug, Clone)]
pub enum Matcher {
    /// Empty query.
    All,
    /// Lowercased needle.
    Substring(String),
    Fuzzy(Regex),
}

impl Matcher {
    pub fn new(query: &str, mode: SearchMode, max_gap: usize) -> Result<Self> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Matcher::All);
        }

        match mode {
            SearchMode::Substring => Ok(Matcher::Substring(query)),
            SearchMode::Fuzzy => {
                let re = RegexBuilder::new(&fuzzy_pattern(&query, max_gap))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| GuestListError::Invalid(format!("Bad search query: {}", e)))?;
                Ok(Matcher::Fuzzy(re))
            }
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::All => true,
            Matcher::Substring(needle) => text.to_lowercase().contains(needle.as_str()),
            Matcher::Fuzzy(re) => re.is_match(text),
        }
    }
}

/// Regex source for a fuzzy query: escaped characters joined by `.{0,max_gap}`.
pub fn fuzzy_pattern(query: &str, max_gap: usize) -> String {
    let gap = format!(".{{0,{}}}", max_gap);
    query
        .chars()
        .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
        .collect::<Vec<_>>()
        .join(&gap)
}
