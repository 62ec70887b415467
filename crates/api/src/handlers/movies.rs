//! Handlers for the read-only movie catalogue.
//!
//! Every handler validates its input completely before touching the store,
//! then runs at most one count and one windowed select under a single
//! deadline.

use std::future::Future;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use movies_core::error::CoreError;
use movies_core::filter::FilterCriteria;
use movies_core::movie::{Movie, MovieSort};
use movies_core::pagination::{PageRequest, PageResult};
use movies_core::types::DbId;
use movies_db::predicate::Predicate;
use movies_db::repositories::MovieRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::Authorized;
use crate::query::{ListMoviesParams, SearchMoviesParams};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run store work under the per-request deadline.
///
/// Exceeding the deadline drops the in-flight statement, which returns its
/// connection to the pool.
async fn with_store_deadline<T, F>(state: &AppState, work: F) -> AppResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    let deadline = state.config.database.query_timeout;
    match tokio::time::timeout(deadline, work).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(AppError::Unavailable(format!(
            "store did not answer within {} ms",
            deadline.as_millis()
        ))),
    }
}

fn page_request(
    state: &AppState,
    page: Option<u32>,
    page_size: Option<u32>,
) -> AppResult<PageRequest> {
    let bounds = state.config.pagination;
    Ok(PageRequest::from_params(
        page,
        page_size,
        bounds.default_page_size,
        bounds.max_page_size,
    )?)
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    AppError::Core(CoreError::Validation(rejection.body_text()))
}

/// Count, fetch and assemble one page for already-validated input.
async fn fetch_page(
    state: &AppState,
    criteria: &FilterCriteria,
    sort: MovieSort,
    page: &PageRequest,
) -> AppResult<PageResult<Movie>> {
    let predicate = Predicate::from_criteria(criteria);
    let (rows, total) =
        with_store_deadline(state, MovieRepo::query_page(&state.pool, &predicate, sort, page))
            .await?;
    Ok(PageResult::assemble(rows, page, total))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /movies
///
/// Filtered, paginated listing. All filters are optional and combine with AND.
pub async fn list_movies(
    State(state): State<AppState>,
    Authorized(caller): Authorized,
    params: Result<Query<ListMoviesParams>, QueryRejection>,
) -> AppResult<Json<PageResult<Movie>>> {
    let Query(params) = params.map_err(query_rejection)?;

    let criteria = FilterCriteria::parse(params.title, params.genre, params.year)?;
    let page = page_request(&state, params.page, params.page_size)?;
    let sort = params.sort.unwrap_or_default();

    let result = fetch_page(&state, &criteria, sort, &page).await?;

    tracing::debug!(
        subject = %caller.subject,
        total_items = result.total_items,
        returned = result.items.len(),
        "Listed movies"
    );
    Ok(Json(result))
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// GET /movies/search
///
/// Title search with the same optional genre/year filters as the listing.
pub async fn search_movies(
    State(state): State<AppState>,
    Authorized(caller): Authorized,
    params: Result<Query<SearchMoviesParams>, QueryRejection>,
) -> AppResult<Json<PageResult<Movie>>> {
    let Query(params) = params.map_err(query_rejection)?;

    let q = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| CoreError::Validation("q is required".into()))?;

    let criteria = FilterCriteria::parse(Some(q), params.genre, params.year)?;
    let page = page_request(&state, params.page, params.page_size)?;
    let sort = params.sort.unwrap_or_default();

    let result = fetch_page(&state, &criteria, sort, &page).await?;

    tracing::debug!(
        subject = %caller.subject,
        total_items = result.total_items,
        "Searched movies"
    );
    Ok(Json(result))
}

// ---------------------------------------------------------------------------
// Get by id
// ---------------------------------------------------------------------------

/// GET /movies/{id}
pub async fn get_movie(
    State(state): State<AppState>,
    Authorized(_caller): Authorized,
    id: Result<Path<DbId>, PathRejection>,
) -> AppResult<Json<Movie>> {
    let Path(id) =
        id.map_err(|rejection| AppError::Core(CoreError::Validation(rejection.body_text())))?;

    let row = with_store_deadline(&state, MovieRepo::find_by_id(&state.pool, id))
        .await?
        .ok_or(CoreError::NotFound { entity: "Movie", id })?;

    Ok(Json(row.into()))
}
