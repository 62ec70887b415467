use movies_core::movie::Movie;
use movies_core::types::{DbId, Year};
use serde::Deserialize;
use sqlx::FromRow;

/// A row of the `movies` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct MovieRow {
    pub movie_id: DbId,
    pub title: String,
    pub year: Option<Year>,
    pub genres: Vec<String>,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Movie {
            id: row.movie_id,
            title: row.title,
            year: row.year,
            genres: row.genres,
        }
    }
}

/// DTO for inserting or replacing a movie.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewMovie {
    pub movie_id: DbId,
    pub title: String,
    pub year: Option<Year>,
    pub genres: Vec<String>,
}
