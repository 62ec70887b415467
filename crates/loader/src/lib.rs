//! Offline loader for MovieLens-style `movies.csv` files.
//!
//! Rows are parsed into [`NewMovie`] values (year taken from the trailing
//! `(YYYY)` of the title, genres split on `|`) and upserted in batches. The
//! first malformed row aborts the load.

use std::io::Read;

use movies_core::movie::{extract_year, parse_genres};
use movies_db::models::movie::NewMovie;
use movies_db::repositories::movie_repo::MAX_UPSERT_BATCH;
use movies_db::repositories::MovieRepo;
use movies_db::DbPool;
use serde::Deserialize;

/// Rows per INSERT statement unless overridden.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// One raw CSV row: `movieId,title,genres`.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvMovieRecord {
    #[serde(rename = "movieId")]
    pub movie_id: String,
    pub title: String,
    #[serde(default)]
    pub genres: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("batch size must be between 1 and {max}, got {got}")]
    InvalidBatchSize { got: usize, max: usize },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Counters reported after a load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows_read: u64,
    pub rows_written: u64,
    pub batches: u64,
}

/// Turn a raw CSV row into an insertable movie.
///
/// `line` is the 1-based CSV line, used only for error messages.
pub fn parse_record(record: CsvMovieRecord, line: u64) -> Result<NewMovie, LoadError> {
    let movie_id = record
        .movie_id
        .trim()
        .parse()
        .map_err(|_| LoadError::InvalidRow {
            line,
            reason: format!("movieId '{}' is not an integer", record.movie_id),
        })?;

    let title = record.title.trim().to_string();
    if title.is_empty() {
        return Err(LoadError::InvalidRow {
            line,
            reason: "title is empty".into(),
        });
    }

    Ok(NewMovie {
        movie_id,
        year: extract_year(&title),
        genres: parse_genres(&record.genres),
        title,
    })
}

/// Iterate the movies of a CSV source in file order.
///
/// The header row is required; column order does not matter.
pub fn read_movies<R: Read>(
    source: R,
) -> Result<impl Iterator<Item = Result<NewMovie, LoadError>>, LoadError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(source);
    let headers = reader.headers()?.clone();

    Ok(reader.into_records().map(move |result| {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let raw: CsvMovieRecord = record.deserialize(Some(&headers))?;
        parse_record(raw, line)
    }))
}

fn check_batch_size(batch_size: usize) -> Result<(), LoadError> {
    if batch_size == 0 || batch_size > MAX_UPSERT_BATCH {
        return Err(LoadError::InvalidBatchSize {
            got: batch_size,
            max: MAX_UPSERT_BATCH,
        });
    }
    Ok(())
}

/// Parse `source` and upsert every movie in batches of `batch_size`.
///
/// Batches already written stay written if a later row is malformed.
pub async fn load_movies<R: Read>(
    pool: &DbPool,
    source: R,
    batch_size: usize,
) -> Result<LoadSummary, LoadError> {
    check_batch_size(batch_size)?;

    let mut summary = LoadSummary::default();
    let mut batch = Vec::with_capacity(batch_size);

    for movie in read_movies(source)? {
        batch.push(movie?);
        summary.rows_read += 1;

        if batch.len() == batch_size {
            flush(pool, &mut batch, &mut summary).await?;
        }
    }
    if !batch.is_empty() {
        flush(pool, &mut batch, &mut summary).await?;
    }

    Ok(summary)
}

async fn flush(
    pool: &DbPool,
    batch: &mut Vec<NewMovie>,
    summary: &mut LoadSummary,
) -> Result<(), LoadError> {
    let written = MovieRepo::upsert_batch(pool, batch).await?;
    summary.rows_written += written;
    summary.batches += 1;
    tracing::debug!(batch = summary.batches, rows = batch.len(), "Batch upserted");
    batch.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn record(id: &str, title: &str, genres: &str) -> CsvMovieRecord {
        CsvMovieRecord {
            movie_id: id.into(),
            title: title.into(),
            genres: genres.into(),
        }
    }

    #[test]
    fn parses_movielens_row() {
        let movie = parse_record(
            record("1", "Toy Story (1995)", "Adventure|Animation|Children|Comedy|Fantasy"),
            2,
        )
        .unwrap();
        assert_eq!(movie.movie_id, 1);
        assert_eq!(movie.title, "Toy Story (1995)");
        assert_eq!(movie.year, Some(1995));
        assert_eq!(
            movie.genres,
            vec!["Adventure", "Animation", "Children", "Comedy", "Fantasy"]
        );
    }

    #[test]
    fn no_genres_marker_becomes_empty_list() {
        let movie = parse_record(record("7", "Unknown Film (2001)", "(no genres listed)"), 2).unwrap();
        assert!(movie.genres.is_empty());
    }

    #[test]
    fn title_without_year_has_no_year() {
        let movie = parse_record(record("8", "Babylon 5", "Sci-Fi"), 2).unwrap();
        assert_eq!(movie.year, None);
    }

    #[test]
    fn non_numeric_id_reports_line() {
        let err = parse_record(record("abc", "Heat (1995)", "Crime"), 17).unwrap_err();
        assert_matches!(err, LoadError::InvalidRow { line: 17, .. });
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn empty_title_is_rejected() {
        let err = parse_record(record("3", "   ", "Comedy"), 4).unwrap_err();
        assert_matches!(err, LoadError::InvalidRow { line: 4, .. });
    }

    #[test]
    fn reads_quoted_titles_with_commas() {
        let csv = "movieId,title,genres\n\
                   1,Toy Story (1995),Comedy\n\
                   11,\"American President, The (1995)\",Comedy|Drama|Romance\n";
        let movies: Vec<NewMovie> = read_movies(csv.as_bytes())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[1].title, "American President, The (1995)");
        assert_eq!(movies[1].year, Some(1995));
        assert_eq!(movies[1].genres, vec!["Comedy", "Drama", "Romance"]);
    }

    #[test]
    fn malformed_row_reports_its_csv_line() {
        let csv = "movieId,title,genres\n1,Toy Story (1995),Comedy\nx,Heat (1995),Crime\n";
        let results: Vec<_> = read_movies(csv.as_bytes()).unwrap().collect();

        assert!(results[0].is_ok());
        assert_matches!(&results[1], Err(LoadError::InvalidRow { line: 3, .. }));
    }

    #[test]
    fn missing_column_is_a_csv_error() {
        let csv = "movieId,genres\n1,Comedy\n";
        let results: Vec<_> = read_movies(csv.as_bytes()).unwrap().collect();
        assert_matches!(&results[0], Err(LoadError::Csv(_)));
    }

    #[test]
    fn batch_size_bounds() {
        assert!(check_batch_size(1).is_ok());
        assert!(check_batch_size(MAX_UPSERT_BATCH).is_ok());
        assert_matches!(check_batch_size(0), Err(LoadError::InvalidBatchSize { .. }));
        assert_matches!(
            check_batch_size(MAX_UPSERT_BATCH + 1),
            Err(LoadError::InvalidBatchSize { .. })
        );
    }
}
