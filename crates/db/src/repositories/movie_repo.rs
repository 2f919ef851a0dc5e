//! Repository for the `movies` table.

use marquee_core::filters::{calculate_metadata, Filters, Metadata};
use marquee_core::types::DbId;
use sqlx::{FromRow, PgPool};

use crate::error::StoreError;
use crate::models::movie::{CreateMovie, Movie};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, created_at, title, year, runtime, genres, version";

/// A movie row carrying the window-function total of the listing query.
#[derive(FromRow)]
struct ListedMovie {
    total_records: i64,
    #[sqlx(flatten)]
    movie: Movie,
}

/// Provides CRUD operations for movies.
pub struct MovieRepo;

impl MovieRepo {
    /// Insert a new movie, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateMovie) -> Result<Movie, sqlx::Error> {
        let query = format!(
            "INSERT INTO movies (title, year, runtime, genres)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Movie>(&query)
            .bind(&input.title)
            .bind(input.year)
            .bind(input.runtime.minutes())
            .bind(&input.genres)
            .fetch_one(pool)
            .await
    }

    /// Find a movie by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Movie>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM movies WHERE id = $1");
        sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List one page of movies matching `title` (full-text, empty matches
    /// all) and containing every genre in `genres`, with the total count.
    ///
    /// `filters` must already have passed validation. The `ORDER BY` column
    /// is the safelist entry itself, never the caller's string.
    pub async fn list(
        pool: &PgPool,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Movie>, Metadata), StoreError> {
        let column = filters.sort_column()?;
        let direction = filters.sort_direction().as_sql();

        let query = format!(
            "SELECT count(*) OVER() AS total_records, {COLUMNS}
             FROM movies
             WHERE (to_tsvector('simple', title) @@ plainto_tsquery('simple', $1) OR $1 = '')
               AND (genres @> $2 OR $2 = '{{}}')
             ORDER BY {column} {direction}, id ASC
             LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, ListedMovie>(&query)
            .bind(title)
            .bind(genres)
            .bind(filters.limit())
            .bind(filters.offset())
            .fetch_all(pool)
            .await?;

        let total = rows.first().map_or(0, |row| row.total_records);
        let metadata = calculate_metadata(total, filters.page, filters.page_size);
        Ok((rows.into_iter().map(|row| row.movie).collect(), metadata))
    }

    /// Write `movie` back if its `version` is still current.
    ///
    /// Returns `None` when the row was changed or deleted since it was read.
    pub async fn update(pool: &PgPool, movie: &Movie) -> Result<Option<Movie>, sqlx::Error> {
        let query = format!(
            "UPDATE movies SET
                title = $3,
                year = $4,
                runtime = $5,
                genres = $6,
                version = version + 1
             WHERE id = $1 AND version = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Movie>(&query)
            .bind(movie.id)
            .bind(movie.version)
            .bind(&movie.title)
            .bind(movie.year)
            .bind(movie.runtime.minutes())
            .bind(&movie.genres)
            .fetch_optional(pool)
            .await
    }
}
