//! Query parameter types for the movie endpoints.
//!
//! Values are only deserialized here. Range checks live in
//! `movies_core::filter` and `movies_core::pagination` so they apply the same
//! way to every endpoint.

use movies_core::movie::MovieSort;
use movies_core::types::Year;
use serde::Deserialize;

/// Query parameters for `GET /movies`.
#[derive(Debug, Default, Deserialize)]
pub struct ListMoviesParams {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub year: Option<Year>,
    pub sort: Option<MovieSort>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Query parameters for `GET /movies/search`. `q` is required.
///
/// Pagination fields are repeated rather than flattened: `serde(flatten)`
/// loses the string-to-number coercion of the query string deserializer.
#[derive(Debug, Default, Deserialize)]
pub struct SearchMoviesParams {
    pub q: Option<String>,
    pub genre: Option<String>,
    pub year: Option<Year>,
    pub sort: Option<MovieSort>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}
