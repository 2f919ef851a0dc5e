pub mod health;
pub mod movies;
pub mod tokens;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/v1` route tree.
///
/// ```text
/// /v1
///   /healthcheck            health
///   /tokens/authentication  login, logout
///   /tokens/activation      request activation token
///   /users/activated        consume activation token
///   /movies                 list
///   /movies/{id}            show, update
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/tokens", tokens::router())
        .nest("/users", users::router())
        .nest("/movies", movies::router())
}
