//! Handlers for the `/users` resource.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use marquee_core::error::CoreError;
use marquee_core::tokens::validate_token_plaintext;
use marquee_core::validation::{FieldErrors, Validator};
use marquee_db::models::user::User;
use serde::{Deserialize, Serialize};

use crate::auth::tokens;
use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// PUT /v1/users/activated
///
/// Consume an activation token. The token is single-use: a second request
/// with the same token, even a concurrent one, gets the 422.
pub async fn activate_user(
    State(state): State<AppState>,
    body: Result<Json<ActivateRequest>, JsonRejection>,
) -> AppResult<Json<UserResponse>> {
    let Json(input) = body?;

    let mut v = Validator::new();
    validate_token_plaintext(&mut v, &input.token);
    v.finish().map_err(CoreError::from)?;

    let user = tokens::activate(state.auth_store.as_ref(), &input.token, Utc::now())
        .await?
        .ok_or_else(|| {
            CoreError::Validation(FieldErrors::single(
                "token",
                "invalid or expired activation token",
            ))
        })?;

    Ok(Json(UserResponse { user }))
}
