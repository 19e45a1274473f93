//! Search filter and category selection.  Together they decide which list
//! the UI shows; neither touches playback state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Song};
use crate::error::PlayerError;

/// Which base list is shown while no search query is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    ForYou,
    TopSongs,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ForYou => "For You",
            Self::TopSongs => "Top Songs",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "for-you" | "for you" | "foryou" => Ok(Self::ForYou),
            "top-songs" | "top songs" | "topsongs" => Ok(Self::TopSongs),
            _ => Err(PlayerError::UnknownCategory(s.to_string())),
        }
    }
}

/// Query plus the results derived from it.
///
/// `results` is always an order-preserving subsequence of the full list.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    query: String,
    results: Vec<Song>,
}

impl SearchState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[Song] {
        &self.results
    }

    /// An empty query means "no filter", not "nothing matches".
    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    /// Replace the query and recompute results synchronously.
    pub fn set_query(&mut self, query: impl Into<String>, catalog: &Catalog) {
        self.query = query.into();
        self.recompute(catalog);
    }

    /// Re-derive results against `catalog`, e.g. after it was replaced.
    pub fn recompute(&mut self, catalog: &Catalog) {
        self.results = if self.query.is_empty() {
            Vec::new()
        } else {
            filter_songs(catalog.full_list(), &self.query)
        };
    }
}

/// Case-insensitive substring match on song names, catalog order preserved.
pub fn filter_songs(songs: &[Song], query: &str) -> Vec<Song> {
    let needle = query.to_lowercase();
    songs
        .iter()
        .filter(|s| s.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// The list actually shown: search results while a query is active,
/// otherwise the list picked by `category`.
pub fn displayed_list<'a>(
    catalog: &'a Catalog,
    search: &'a SearchState,
    category: Category,
) -> &'a [Song] {
    if search.is_active() {
        return search.results();
    }
    match category {
        Category::ForYou => catalog.full_list(),
        Category::TopSongs => catalog.top_list(),
    }
}
