//! Bearer-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use marquee_core::error::CoreError;
use marquee_core::tokens::Scope;
use marquee_db::models::user::User;

use crate::auth::tokens;
use crate::error::AppError;
use crate::state::AppState;

const MISSING_TOKEN: &str = "you must be authenticated to access this resource";
const INVALID_TOKEN: &str = "invalid or missing authentication token";

/// User resolved from an `Authorization: Bearer <token>` header carrying a
/// live authentication-scope token.
///
/// ```ignore
/// async fn my_handler(AuthUser { user }: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized(MISSING_TOKEN.into())))?;

        let token = header
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized(INVALID_TOKEN.into())))?;

        let user = tokens::resolve(
            state.auth_store.as_ref(),
            token.trim(),
            Scope::Authentication,
            Utc::now(),
        )
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized(INVALID_TOKEN.into())))?;

        Ok(AuthUser { user })
    }
}
