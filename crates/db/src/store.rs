//! Storage contracts used by the API layer, and their Postgres implementation.
//!
//! Handlers talk to `dyn AuthStore` / `dyn MovieStore` rather than to the
//! repositories directly so the same request path can run against
//! [`crate::memory::MemoryStore`] in tests. Nothing here caches: every call
//! goes to storage, so a deleted or expired token stops working on the very
//! next check.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use marquee_core::filters::{Filters, Metadata};
use marquee_core::permissions::{Permissions, DEFAULT_GRANTS};
use marquee_core::tokens::{Scope, Token, TokenHash};
use marquee_core::types::{DbId, Timestamp};

use crate::error::StoreError;
use crate::models::movie::Movie;
use crate::models::user::User;
use crate::repositories::{MovieRepo, PermissionRepo, TokenRepo, UserRepo};
use crate::DbPool;

/// Identity and token persistence.
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Persist a token's hash, owner, expiry and scope.
    async fn insert_token(&self, token: &Token) -> Result<(), StoreError>;

    /// Owner of an unexpired token matching both `hash` and `scope`.
    async fn get_user_for_token(
        &self,
        hash: &TokenHash,
        scope: Scope,
        now: Timestamp,
    ) -> Result<Option<User>, StoreError>;

    async fn delete_tokens_for_user(&self, user_id: DbId, scope: Scope)
        -> Result<u64, StoreError>;

    /// In one transaction: consume the activation token, mark its owner
    /// activated, grant the default permissions, and delete the owner's
    /// remaining activation tokens. `None` if the token was not usable.
    async fn activate_with_token(
        &self,
        hash: &TokenHash,
        now: Timestamp,
    ) -> Result<Option<User>, StoreError>;

    async fn delete_expired_tokens(&self, now: Timestamp) -> Result<u64, StoreError>;

    async fn get_permissions_for_user(&self, user_id: DbId) -> Result<Permissions, StoreError>;
}

/// Movie record access.
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// One page of matching movies plus pagination metadata.
    async fn list_movies(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Movie>, Metadata), StoreError>;

    async fn get_movie(&self, id: DbId) -> Result<Option<Movie>, StoreError>;

    /// Optimistically-locked update; [`StoreError::EditConflict`] when
    /// `movie.version` is stale.
    async fn update_movie(&self, movie: &Movie) -> Result<Movie, StoreError>;
}

/// Postgres-backed store. Every call is bounded by `query_timeout`.
///
/// Dropping a pending call (e.g. a cancelled request) drops its transaction,
/// which rolls back.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
    query_timeout: Duration,
}

impl PgStore {
    pub fn new(pool: DbPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn bounded<T, E, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, E>>,
        StoreError: From<E>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.query_timeout.as_millis() as u64,
                    "Storage call timed out"
                );
                Err(StoreError::Timeout)
            }
        }
    }
}

async fn activate_in_tx(
    pool: &DbPool,
    hash: &TokenHash,
    now: Timestamp,
) -> Result<Option<User>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(user_id) = TokenRepo::take(&mut *tx, hash, Scope::Activation, now).await? else {
        return Ok(None);
    };
    let user = UserRepo::activate(&mut *tx, user_id).await?;
    PermissionRepo::add_for_user(&mut *tx, user_id, DEFAULT_GRANTS).await?;
    TokenRepo::delete_all_for_user(&mut *tx, user_id, Scope::Activation).await?;

    tx.commit().await?;
    Ok(Some(user))
}

#[async_trait]
impl AuthStore for PgStore {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.bounded(UserRepo::find_by_email(&self.pool, email)).await
    }

    async fn insert_token(&self, token: &Token) -> Result<(), StoreError> {
        self.bounded(TokenRepo::insert(&self.pool, token)).await
    }

    async fn get_user_for_token(
        &self,
        hash: &TokenHash,
        scope: Scope,
        now: Timestamp,
    ) -> Result<Option<User>, StoreError> {
        self.bounded(UserRepo::find_for_token(&self.pool, hash, scope, now))
            .await
    }

    async fn delete_tokens_for_user(
        &self,
        user_id: DbId,
        scope: Scope,
    ) -> Result<u64, StoreError> {
        self.bounded(TokenRepo::delete_all_for_user(&self.pool, user_id, scope))
            .await
    }

    async fn activate_with_token(
        &self,
        hash: &TokenHash,
        now: Timestamp,
    ) -> Result<Option<User>, StoreError> {
        self.bounded(activate_in_tx(&self.pool, hash, now)).await
    }

    async fn delete_expired_tokens(&self, now: Timestamp) -> Result<u64, StoreError> {
        self.bounded(TokenRepo::delete_expired(&self.pool, now)).await
    }

    async fn get_permissions_for_user(&self, user_id: DbId) -> Result<Permissions, StoreError> {
        self.bounded(PermissionRepo::get_all_for_user(&self.pool, user_id))
            .await
    }
}

#[async_trait]
impl MovieStore for PgStore {
    async fn list_movies(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Movie>, Metadata), StoreError> {
        self.bounded(MovieRepo::list(&self.pool, title, genres, filters))
            .await
    }

    async fn get_movie(&self, id: DbId) -> Result<Option<Movie>, StoreError> {
        self.bounded(MovieRepo::find_by_id(&self.pool, id)).await
    }

    async fn update_movie(&self, movie: &Movie) -> Result<Movie, StoreError> {
        self.bounded(MovieRepo::update(&self.pool, movie))
            .await?
            .ok_or(StoreError::EditConflict)
    }
}
