//! Repository for the `tokens` table.

use marquee_core::tokens::{Scope, Token, TokenHash};
use marquee_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

/// Provides persistence for hashed tokens. Rows are never updated in place.
pub struct TokenRepo;

impl TokenRepo {
    /// Persist `(hash, user_id, expiry, scope)`. The plaintext is not stored.
    pub async fn insert(pool: &PgPool, token: &Token) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO tokens (hash, user_id, expiry, scope)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&token.hash[..])
        .bind(token.user_id)
        .bind(token.expiry)
        .bind(token.scope.as_str())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Delete a single unexpired token and return its owner.
    ///
    /// The `DELETE ... RETURNING` is what makes one-time tokens single use:
    /// of two concurrent callers only one gets the row back.
    pub async fn take<'e, E: PgExecutor<'e>>(
        executor: E,
        hash: &TokenHash,
        scope: Scope,
        now: Timestamp,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "DELETE FROM tokens
             WHERE hash = $1 AND scope = $2 AND expiry > $3
             RETURNING user_id",
        )
        .bind(&hash[..])
        .bind(scope.as_str())
        .bind(now)
        .fetch_optional(executor)
        .await
    }

    /// Delete every token of `scope` belonging to a user. Returns the count.
    pub async fn delete_all_for_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: DbId,
        scope: Scope,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tokens WHERE user_id = $1 AND scope = $2")
            .bind(user_id)
            .bind(scope.as_str())
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete tokens whose expiry has passed. Returns the count.
    pub async fn delete_expired(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tokens WHERE expiry <= $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
