//! Route definitions for the `/tokens` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::tokens;
use crate::state::AppState;

/// Routes mounted at `/tokens`.
///
/// ```text
/// POST   /authentication  -> create_authentication_token
/// DELETE /authentication  -> delete_authentication_tokens (requires auth)
/// POST   /activation      -> create_activation_token
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/authentication",
            post(tokens::create_authentication_token).delete(tokens::delete_authentication_tokens),
        )
        .route("/activation", post(tokens::create_activation_token))
}
