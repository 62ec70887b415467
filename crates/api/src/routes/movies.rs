//! Route definitions for the movie catalogue.

use axum::routing::get;
use axum::Router;

use crate::handlers::movies;
use crate::state::AppState;

/// Movie routes mounted at `/movies`.
///
/// All routes require an authenticated caller (enforced by handler extractors).
///
/// ```text
/// GET  /          -> list_movies
/// GET  /search    -> search_movies
/// GET  /{id}      -> get_movie
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(movies::list_movies))
        .route("/search", get(movies::search_movies))
        .route("/{id}", get(movies::get_movie))
}
