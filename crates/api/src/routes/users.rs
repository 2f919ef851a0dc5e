//! Route definitions for the `/users` resource.

use axum::routing::put;
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// PUT /activated  -> activate_user
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/activated", put(users::activate_user))
}
