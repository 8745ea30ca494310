pub mod matcher;

use crate::error::Result;
use crate::guest::Guest;

pub use matcher::{Matcher, SearchMode, DEFAULT_MAX_GAP};

/// Visibility predicate over guests, built from a search query.
#[derive(Debug, Clone)]
pub struct GuestFilter {
    matcher: Matcher,
}

impl GuestFilter {
    pub fn new(query: &str, mode: SearchMode, max_gap: usize) -> Result<Self> {
        Ok(Self {
            matcher: Matcher::new(query, mode, max_gap)?,
        })
    }

    /// Filter that shows every guest.
    pub fn all() -> Self {
        Self {
            matcher: Matcher::All,
        }
    }

    /// A guest is visible if its name or its host's name matches.
    pub fn matches(&self, guest: &Guest) -> bool {
        self.matcher.is_match(&guest.name) || self.matcher.is_match(&guest.host)
    }

    pub fn is_all(&self) -> bool {
        matches!(self.matcher, Matcher::All)
    }
}

impl Default for GuestFilter {
    fn default() -> Self {
        Self::all()
    }
}

/// Whether a search is currently applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchToggle {
    Active,
    Cleared,
}

/// Search box state: submitting the same query twice clears the search.
#[derive(Debug, Clone)]
pub struct SearchState {
    mode: SearchMode,
    max_gap: usize,
    toggle: SearchToggle,
    last_query: Option<String>,
}

impl SearchState {
    pub fn new(mode: SearchMode, max_gap: usize) -> Self {
        Self {
            mode,
            max_gap,
            toggle: SearchToggle::Active,
            last_query: None,
        }
    }

    pub fn toggle(&self) -> SearchToggle {
        self.toggle
    }

    /// Submit a query and return the filter to apply.
    ///
    /// A repeated query flips between `Active` and `Cleared`; a new query is
    /// always `Active`. While cleared the filter shows everyone.
    pub fn submit(&mut self, query: &str) -> Result<GuestFilter> {
        self.toggle = match (self.last_query.as_deref(), self.toggle) {
            (Some(last), SearchToggle::Active) if last == query => SearchToggle::Cleared,
            _ => SearchToggle::Active,
        };
        self.last_query = Some(query.to_string());

        match self.toggle {
            SearchToggle::Active => GuestFilter::new(query, self.mode, self.max_gap),
            SearchToggle::Cleared => Ok(GuestFilter::all()),
        }
    }

    /// Label for the search button in the current state.
    pub fn button_label(&self) -> &'static str {
        match self.toggle {
            SearchToggle::Active => "Clear Search",
            SearchToggle::Cleared => "Search",
        }
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new(SearchMode::default(), DEFAULT_MAX_GAP)
    }
}
