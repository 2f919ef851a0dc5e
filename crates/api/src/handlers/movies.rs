//! Handlers for the `/movies` resource.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Datelike, Utc};
use marquee_core::error::CoreError;
use marquee_core::filters::{Filters, Metadata};
use marquee_core::types::DbId;
use marquee_core::validation::Validator;
use marquee_db::models::movie::{Movie, UpdateMovie};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::permissions::{RequireMoviesRead, RequireMoviesWrite};
use crate::state::AppState;

/// Columns a client may sort movies by, each optionally prefixed with `-`.
pub const MOVIE_SORT_SAFELIST: &[&str] = &["id", "title", "year", "runtime"];

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 20;
const DEFAULT_SORT: &str = "id";

/// Earliest year a film can have been released.
const FIRST_FILM_YEAR: i32 = 1888;
const MAX_TITLE_BYTES: usize = 500;
const MAX_GENRES: usize = 5;

#[derive(Debug, Serialize)]
pub struct MovieListResponse {
    pub movies: Vec<Movie>,
    pub metadata: Metadata,
}

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub movie: Movie,
}

fn read_string(qs: &HashMap<String, String>, key: &str, default: &str) -> String {
    match qs.get(key) {
        Some(s) if !s.is_empty() => s.clone(),
        _ => default.to_string(),
    }
}

fn read_csv(qs: &HashMap<String, String>, key: &str) -> Vec<String> {
    match qs.get(key) {
        Some(s) if !s.is_empty() => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

fn read_int<T: FromStr>(
    qs: &HashMap<String, String>,
    key: &str,
    default: T,
    v: &mut Validator,
) -> T {
    match qs.get(key) {
        Some(s) if !s.is_empty() => s.parse().unwrap_or_else(|_| {
            v.add_error(key, "must be an integer value");
            default
        }),
        _ => default,
    }
}

/// Record every field violation of a complete movie on `v`.
pub fn validate_movie(v: &mut Validator, movie: &Movie) {
    v.check(!movie.title.is_empty(), "title", "must be provided");
    v.check(
        movie.title.len() <= MAX_TITLE_BYTES,
        "title",
        "must not be more than 500 bytes long",
    );

    v.check(movie.year != 0, "year", "must be provided");
    v.check(movie.year >= FIRST_FILM_YEAR, "year", "must be greater than 1888");
    v.check(
        movie.year <= Utc::now().year(),
        "year",
        "must not be in the future",
    );

    v.check(movie.runtime.minutes() != 0, "runtime", "must be provided");
    v.check(
        movie.runtime.minutes() > 0,
        "runtime",
        "must be a positive integer",
    );

    v.check(!movie.genres.is_empty(), "genres", "must contain at least 1 genre");
    v.check(
        movie.genres.len() <= MAX_GENRES,
        "genres",
        "must not contain more than 5 genres",
    );
    let unique: HashSet<&str> = movie.genres.iter().map(String::as_str).collect();
    v.check(
        unique.len() == movie.genres.len(),
        "genres",
        "must not contain duplicate values",
    );
}

/// GET /v1/movies
///
/// Query: `title`, `genres` (comma-separated), `page`, `page_size`, `sort`.
pub async fn list_movies(
    State(state): State<AppState>,
    _auth: RequireMoviesRead,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> AppResult<Json<MovieListResponse>> {
    let Query(qs) = query?;
    let mut v = Validator::new();

    let title = read_string(&qs, "title", "");
    let genres = read_csv(&qs, "genres");
    let filters = Filters {
        page: read_int(&qs, "page", DEFAULT_PAGE, &mut v),
        page_size: read_int(&qs, "page_size", DEFAULT_PAGE_SIZE, &mut v),
        sort: read_string(&qs, "sort", DEFAULT_SORT),
        sort_safelist: MOVIE_SORT_SAFELIST,
    };
    filters.validate(&mut v);
    v.finish().map_err(CoreError::from)?;

    let (movies, metadata) = state
        .movie_store
        .list_movies(&title, &genres, &filters)
        .await?;

    Ok(Json(MovieListResponse { movies, metadata }))
}

async fn load_movie(state: &AppState, id: DbId) -> AppResult<Movie> {
    if id < 1 {
        return Err(CoreError::NotFound { entity: "movie", id }.into());
    }
    state
        .movie_store
        .get_movie(id)
        .await?
        .ok_or_else(|| CoreError::NotFound { entity: "movie", id }.into())
}

/// GET /v1/movies/{id}
pub async fn show_movie(
    State(state): State<AppState>,
    _auth: RequireMoviesRead,
    id: Result<Path<DbId>, PathRejection>,
) -> AppResult<Json<MovieResponse>> {
    let Path(id) = id?;
    let movie = load_movie(&state, id).await?;
    Ok(Json(MovieResponse { movie }))
}

/// PATCH /v1/movies/{id}
///
/// Partial update guarded by the record's `version`.
pub async fn update_movie(
    State(state): State<AppState>,
    RequireMoviesWrite(auth): RequireMoviesWrite,
    id: Result<Path<DbId>, PathRejection>,
    body: Result<Json<UpdateMovie>, JsonRejection>,
) -> AppResult<Json<MovieResponse>> {
    let Path(id) = id?;
    let mut movie = load_movie(&state, id).await?;
    let Json(input) = body?;

    movie.apply(input);

    let mut v = Validator::new();
    validate_movie(&mut v, &movie);
    v.finish().map_err(CoreError::from)?;

    let movie = state.movie_store.update_movie(&movie).await?;
    tracing::info!(
        movie_id = movie.id,
        user_id = auth.user.id,
        version = movie.version,
        "Movie updated"
    );

    Ok(Json(MovieResponse { movie }))
}
