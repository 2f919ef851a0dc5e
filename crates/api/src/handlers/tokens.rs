//! Handlers for the `/tokens` resource (login, logout, activation requests).

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use marquee_core::error::CoreError;
use marquee_core::tokens::Scope;
use marquee_core::types::Timestamp;
use marquee_core::validation::{validate_email, validate_password_plaintext, FieldErrors, Validator};
use serde::{Deserialize, Serialize};

use crate::auth::{password, tokens};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "invalid authentication credentials";

/// Request body for `POST /tokens/authentication`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /tokens/activation`.
#[derive(Debug, Deserialize)]
pub struct ActivationRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expiry: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct AuthenticationTokenResponse {
    pub authentication_token: IssuedToken,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /v1/tokens/authentication
///
/// Verify an email/password pair and issue an authentication token. An
/// unknown email and a wrong password produce the same 401.
pub async fn create_authentication_token(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AuthenticationTokenResponse>)> {
    let Json(input) = body?;

    let mut v = Validator::new();
    validate_email(&mut v, &input.email);
    validate_password_plaintext(&mut v, &input.password);
    v.finish().map_err(CoreError::from)?;

    let user = state.auth_store.get_user_by_email(&input.email).await?;
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());

    let matched = password::matches(input.password, stored_hash).await?;
    let user = match user {
        Some(user) if matched => user,
        _ => {
            tracing::info!("Authentication failed");
            return Err(AppError::Core(CoreError::Unauthorized(
                INVALID_CREDENTIALS.into(),
            )));
        }
    };

    let token = tokens::issue(
        state.auth_store.as_ref(),
        user.id,
        state.config.tokens.authentication_ttl,
        Scope::Authentication,
    )
    .await?;

    tracing::info!(user_id = user.id, "Authentication token issued");

    Ok((
        StatusCode::CREATED,
        Json(AuthenticationTokenResponse {
            authentication_token: IssuedToken {
                token: token.plaintext,
                expiry: token.expiry,
            },
        }),
    ))
}

/// DELETE /v1/tokens/authentication
///
/// Revoke every authentication token held by the caller.
pub async fn delete_authentication_tokens(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<StatusCode> {
    tokens::revoke_all(state.auth_store.as_ref(), auth.user.id, Scope::Authentication).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/tokens/activation
///
/// Issue a fresh activation token for a not-yet-activated account and mail
/// it. Delivery happens in the background; the response does not wait on it.
pub async fn create_activation_token(
    State(state): State<AppState>,
    body: Result<Json<ActivationRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let Json(input) = body?;

    let mut v = Validator::new();
    validate_email(&mut v, &input.email);
    v.finish().map_err(CoreError::from)?;

    let user = state
        .auth_store
        .get_user_by_email(&input.email)
        .await?
        .ok_or_else(|| {
            CoreError::Validation(FieldErrors::single("email", "no matching email address found"))
        })?;

    if user.activated {
        return Err(CoreError::Validation(FieldErrors::single(
            "email",
            "user has already been activated",
        ))
        .into());
    }

    let token = tokens::issue(
        state.auth_store.as_ref(),
        user.id,
        state.config.tokens.activation_ttl,
        Scope::Activation,
    )
    .await?;

    let mailer = state.mailer.clone();
    let recipient = user.email.clone();
    let user_id = user.id;
    tokio::spawn(async move {
        if let Err(e) = mailer
            .send_activation(&recipient, &token.plaintext, token.expiry)
            .await {
            tracing::error!(error = %e, user_id, "Failed to send activation email");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "an email will be sent to you containing activation instructions",
        }),
    ))
}
