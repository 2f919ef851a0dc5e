//! Route definitions for the `/movies` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::movies;
use crate::state::AppState;

/// Routes mounted at `/movies`.
///
/// ```text
/// GET   /      -> list_movies  (movies:read)
/// GET   /{id}  -> show_movie   (movies:read)
/// PATCH /{id}  -> update_movie (movies:write)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(movies::list_movies))
        .route(
            "/{id}",
            get(movies::show_movie).patch(movies::update_movie),
        )
}
