//! Opaque-token issuance and resolution against an [`AuthStore`].
//!
//! The plaintext only exists in the value returned by [`issue`]; everything
//! after that works from the SHA-256 hash. Expired, unknown, wrong-scope and
//! malformed tokens all resolve to `None` so callers cannot tell them apart.

use chrono::Utc;
use marquee_core::tokens::{generate_token, hash_token, Scope, Token, TOKEN_PLAINTEXT_LEN};
use marquee_core::types::{DbId, Timestamp};
use marquee_db::models::user::User;
use marquee_db::{AuthStore, StoreError};

/// Generate a token for `user_id` and persist it before handing it back.
pub async fn issue(
    store: &dyn AuthStore,
    user_id: DbId,
    ttl: chrono::Duration,
    scope: Scope,
) -> Result<Token, StoreError> {
    let token = generate_token(user_id, ttl, scope, Utc::now());
    store.insert_token(&token).await?;
    tracing::debug!(user_id, scope = %scope, expiry = %token.expiry, "Token issued");
    Ok(token)
}

/// Owner of `plaintext` if it is a live token of `scope` at `now`.
pub async fn resolve(
    store: &dyn AuthStore,
    plaintext: &str,
    scope: Scope,
    now: Timestamp,
) -> Result<Option<User>, StoreError> {
    if plaintext.len() != TOKEN_PLAINTEXT_LEN {
        return Ok(None);
    }
    store
        .get_user_for_token(&hash_token(plaintext), scope, now)
        .await
}

/// Consume an activation token and activate its owner.
///
/// At most one caller can succeed for a given token; every other caller,
/// concurrent or later, gets `None`.
pub async fn activate(
    store: &dyn AuthStore,
    plaintext: &str,
    now: Timestamp,
) -> Result<Option<User>, StoreError> {
    if plaintext.len() != TOKEN_PLAINTEXT_LEN {
        return Ok(None);
    }
    let user = store.activate_with_token(&hash_token(plaintext), now).await?;
    if let Some(user) = &user {
        tracing::info!(user_id = user.id, "User activated");
    }
    Ok(user)
}

/// Delete every outstanding `scope` token belonging to `user_id`.
pub async fn revoke_all(
    store: &dyn AuthStore,
    user_id: DbId,
    scope: Scope,
) -> Result<u64, StoreError> {
    let deleted = store.delete_tokens_for_user(user_id, scope).await?;
    tracing::info!(user_id, scope = %scope, deleted, "Tokens revoked");
    Ok(deleted)
}
