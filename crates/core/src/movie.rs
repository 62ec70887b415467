//! Public movie representation and MovieLens parsing helpers.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{DbId, Year};

// ---------------------------------------------------------------------------
// Movie
// ---------------------------------------------------------------------------

/// A movie as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: DbId,
    pub title: String,
    pub year: Option<Year>,
    pub genres: Vec<String>,
}

/// Stable ordering applied to listings so that paging never skips or repeats
/// rows between requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovieSort {
    /// Primary key ascending.
    #[default]
    Id,
    /// Title ascending, primary key as tie-breaker.
    Title,
}

// ---------------------------------------------------------------------------
// Genres
// ---------------------------------------------------------------------------

/// Marker MovieLens uses for movies without any genre.
pub const NO_GENRES_LISTED: &str = "(no genres listed)";

/// Genre labels used by the MovieLens data set.
pub const KNOWN_GENRES: &[&str] = &[
    "Action",
    "Adventure",
    "Animation",
    "Children",
    "Comedy",
    "Crime",
    "Documentary",
    "Drama",
    "Fantasy",
    "Film-Noir",
    "Horror",
    "IMAX",
    "Musical",
    "Mystery",
    "Romance",
    "Sci-Fi",
    "Thriller",
    "War",
    "Western",
];

/// Map a genre to its canonical spelling when it is a known label
/// (case-insensitive). Unknown labels are returned unchanged.
pub fn canonical_genre(genre: &str) -> &str {
    KNOWN_GENRES
        .iter()
        .find(|known| known.eq_ignore_ascii_case(genre))
        .copied()
        .unwrap_or(genre)
}

/// Split a pipe-separated MovieLens genre list, dropping empty entries and
/// the "no genres" marker.
pub fn parse_genres(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty() && *g != NO_GENRES_LISTED)
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Titles
// ---------------------------------------------------------------------------

static TRAILING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d{4})\)\s*$").expect("trailing year pattern is valid"));

/// Extract the release year from a title such as `"Toy Story (1995)"`.
///
/// Only a four-digit year in parentheses at the very end counts.
pub fn extract_year(title: &str) -> Option<Year> {
    TRAILING_YEAR
        .captures(title)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
