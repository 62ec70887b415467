//! Repository for the `movies` table.
//!
//! Listing is always pushed into the store: one `COUNT(*)` over the
//! predicate and one windowed `SELECT` with `LIMIT`/`OFFSET`. Only the
//! loader writes.

use std::collections::HashSet;

use movies_core::movie::MovieSort;
use movies_core::pagination::PageRequest;
use movies_core::types::DbId;
use sqlx::PgPool;

use crate::models::movie::{MovieRow, NewMovie};
use crate::predicate::Predicate;

/// Column list for `movies` SELECT queries.
const COLUMNS: &str = "movie_id, title, year, genres";

/// Bind parameters per row in [`MovieRepo::upsert_batch`].
const UPSERT_PARAMS_PER_ROW: usize = 4;

/// Largest batch that fits PostgreSQL's 65535 bind-parameter limit.
pub const MAX_UPSERT_BATCH: usize = u16::MAX as usize / UPSERT_PARAMS_PER_ROW;

/// `ORDER BY` clause for a sort key. Every ordering ends on the primary key
/// so windows never overlap.
fn order_by(sort: MovieSort) -> &'static str {
    match sort {
        MovieSort::Id => "ORDER BY movie_id",
        MovieSort::Title => "ORDER BY title, movie_id",
    }
}

/// Keep only the last occurrence of each `movie_id`, in input order.
///
/// PostgreSQL refuses an `ON CONFLICT DO UPDATE` that touches the same row
/// twice in one statement.
fn last_per_id(movies: &[NewMovie]) -> Vec<&NewMovie> {
    let mut seen = HashSet::with_capacity(movies.len());
    let mut kept: Vec<&NewMovie> = movies
        .iter()
        .rev()
        .filter(|movie| seen.insert(movie.movie_id))
        .collect();
    kept.reverse();
    kept
}

/// Provides read queries and loader writes for movies.
pub struct MovieRepo;

impl MovieRepo {
    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Find a movie by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MovieRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM movies WHERE movie_id = $1");
        sqlx::query_as::<_, MovieRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Count rows matching the predicate.
    pub async fn count(pool: &PgPool, predicate: &Predicate) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*)::BIGINT AS count FROM movies {}",
            predicate.where_clause()
        );
        predicate
            .bind_query_scalar(sqlx::query_scalar::<_, i64>(&query))
            .fetch_one(pool)
            .await
    }

    /// Fetch one window of rows matching the predicate, in a stable order.
    pub async fn list_page(
        pool: &PgPool,
        predicate: &Predicate,
        sort: MovieSort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MovieRow>, sqlx::Error> {
        let limit_idx = predicate.next_bind_index();
        let query = format!(
            "SELECT {COLUMNS} FROM movies {} {} LIMIT ${limit_idx} OFFSET ${}",
            predicate.where_clause(),
            order_by(sort),
            limit_idx + 1
        );
        predicate
            .bind_query_as(sqlx::query_as::<_, MovieRow>(&query))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Run the count and the windowed select for one page request.
    ///
    /// Each statement checks a connection out of the pool and returns it when
    /// the statement finishes, so a failed count never holds a connection
    /// while the select waits. The two reads are not wrapped in a
    /// transaction; they see whatever each statement's snapshot sees.
    pub async fn query_page(
        pool: &PgPool,
        predicate: &Predicate,
        sort: MovieSort,
        page: &PageRequest,
    ) -> Result<(Vec<MovieRow>, i64), sqlx::Error> {
        tracing::debug!(
            conditions = predicate.conditions().len(),
            ?sort,
            page = page.page(),
            page_size = page.page_size(),
            "Querying movie page"
        );

        let total = Self::count(pool, predicate).await?;
        let rows = Self::list_page(pool, predicate, sort, page.limit(), page.offset()).await?;

        Ok((rows, total))
    }

    // -----------------------------------------------------------------------
    // Writes (loader only)
    // -----------------------------------------------------------------------

    /// Insert or replace a batch of movies keyed on `movie_id`.
    ///
    /// Uses a single multi-row INSERT. When an ID repeats within the batch the
    /// last row wins. Callers must keep batches at or below
    /// [`MAX_UPSERT_BATCH`]. Returns the number of rows written.
    pub async fn upsert_batch(pool: &PgPool, movies: &[NewMovie]) -> Result<u64, sqlx::Error> {
        let movies = last_per_id(movies);
        if movies.is_empty() {
            return Ok(0);
        }

        let mut query = format!("INSERT INTO movies ({COLUMNS}) VALUES ");
        let mut param_idx = 1usize;

        for row in 0..movies.len() {
            if row > 0 {
                query.push_str(", ");
            }
            query.push('(');
            for i in 0..UPSERT_PARAMS_PER_ROW {
                if i > 0 {
                    query.push_str(", ");
                }
                query.push_str(&format!("${param_idx}"));
                param_idx += 1;
            }
            query.push(')');
        }

        query.push_str(
            " ON CONFLICT (movie_id) DO UPDATE SET \
                 title = EXCLUDED.title, \
                 year = EXCLUDED.year, \
                 genres = EXCLUDED.genres",
        );

        let mut q = sqlx::query(&query);
        for movie in &movies {
            q = q
                .bind(movie.movie_id)
                .bind(&movie.title)
                .bind(movie.year)
                .bind(&movie.genres);
        }

        let result = q.execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Total number of movies, unfiltered.
    pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
        Self::count(pool, &Predicate::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_ordering_ends_on_primary_key() {
        assert!(order_by(MovieSort::Id).ends_with("movie_id"));
        assert!(order_by(MovieSort::Title).ends_with("movie_id"));
    }

    fn movie(id: i64, title: &str) -> NewMovie {
        NewMovie {
            movie_id: id,
            title: title.to_string(),
            year: None,
            genres: Vec::new(),
        }
    }

    #[test]
    fn repeated_ids_keep_last_row() {
        let batch = [movie(1, "a"), movie(2, "b"), movie(1, "c"), movie(3, "d")];
        let kept: Vec<(i64, &str)> = last_per_id(&batch)
            .iter()
            .map(|m| (m.movie_id, m.title.as_str()))
            .collect();
        assert_eq!(kept, vec![(2, "b"), (1, "c"), (3, "d")]);
    }

    #[test]
    fn distinct_ids_pass_through() {
        let batch = [movie(5, "x"), movie(4, "y")];
        assert_eq!(last_per_id(&batch).len(), 2);
    }

    #[test]
    fn max_batch_fits_bind_limit() {
        assert!(MAX_UPSERT_BATCH * UPSERT_PARAMS_PER_ROW <= u16::MAX as usize);
    }
}
