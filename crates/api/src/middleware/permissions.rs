//! Permission-code extractors.
//!
//! Each extractor wraps [`AuthUser`], then requires an activated account and
//! finally the named permission code. Token problems surface as 401 from the
//! inner extractor; everything here is a 403.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use marquee_core::error::CoreError;
use marquee_core::permissions::{MOVIES_READ, MOVIES_WRITE};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

const INACTIVE_ACCOUNT: &str = "your user account must be activated to access this resource";
const NOT_PERMITTED: &str =
    "your user account doesn't have the necessary permissions to access this resource";

async fn require_permission(
    parts: &mut Parts,
    state: &AppState,
    code: &str,
) -> Result<AuthUser, AppError> {
    let auth = AuthUser::from_request_parts(parts, state).await?;
    if !auth.user.activated {
        return Err(AppError::Core(CoreError::Forbidden(INACTIVE_ACCOUNT.into())));
    }

    let permissions = state
        .auth_store
        .get_permissions_for_user(auth.user.id)
        .await?;
    if !permissions.includes(code) {
        tracing::debug!(user_id = auth.user.id, code, "Permission denied");
        return Err(AppError::Core(CoreError::Forbidden(NOT_PERMITTED.into())));
    }
    Ok(auth)
}

/// Requires `movies:read`.
pub struct RequireMoviesRead(pub AuthUser);

impl FromRequestParts<AppState> for RequireMoviesRead {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_permission(parts, state, MOVIES_READ)
            .await
            .map(RequireMoviesRead)
    }
}

/// Requires `movies:write`.
pub struct RequireMoviesWrite(pub AuthUser);

impl FromRequestParts<AppState> for RequireMoviesWrite {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_permission(parts, state, MOVIES_WRITE)
            .await
            .map(RequireMoviesWrite)
    }
}
