//! Repository for the `users` table.

use marquee_core::tokens::{Scope, TokenHash};
use marquee_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, created_at, name, email, password_hash, activated, version";

/// Provides lookups and state changes for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, activated)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(input.activated)
            .fetch_one(pool)
            .await
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find the owner of an unexpired token with the given hash and scope.
    ///
    /// A wrong scope, an expired row, and a missing row all yield `None`.
    pub async fn find_for_token(
        pool: &PgPool,
        hash: &TokenHash,
        scope: Scope,
        now: Timestamp,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT users.id, users.created_at, users.name, users.email,
                    users.password_hash, users.activated, users.version
             FROM users
             INNER JOIN tokens ON users.id = tokens.user_id
             WHERE tokens.hash = $1
               AND tokens.scope = $2
               AND tokens.expiry > $3",
        )
        .bind(&hash[..])
        .bind(scope.as_str())
        .bind(now)
        .fetch_optional(pool)
        .await
    }

    /// Mark a user as activated and bump its version.
    pub async fn activate<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "UPDATE users SET activated = true, version = version + 1
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_one(executor)
            .await
    }
}
