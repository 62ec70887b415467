pub mod health;
pub mod movies;

use axum::Router;

use crate::state::AppState;

/// Build the API route tree.
///
/// ```text
/// /movies                 list (filters + pagination)
/// /movies/search          title search
/// /movies/{id}            single movie
/// ```
///
/// `/health` is merged separately (see [`crate::build_app`]) and needs no
/// credentials.
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/movies", movies::router())
}

