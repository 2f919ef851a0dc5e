//! In-process implementation of the storage contracts.
//!
//! Backs the HTTP integration tests and local experiments without Postgres.
//! A single mutex guards all state, which gives every trait method the same
//! all-or-nothing behaviour as a database transaction. The lock is never held
//! across an `.await`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use marquee_core::error::InvariantViolation;
use marquee_core::filters::{calculate_metadata, Filters, Metadata, SortDirection};
use marquee_core::permissions::{Permissions, DEFAULT_GRANTS};
use marquee_core::tokens::{Scope, Token, TokenHash};
use marquee_core::types::{DbId, Timestamp};

use crate::error::StoreError;
use crate::models::movie::{CreateMovie, Movie};
use crate::models::user::{CreateUser, User};
use crate::store::{AuthStore, MovieStore};

#[derive(Debug, Clone)]
struct StoredToken {
    hash: TokenHash,
    user_id: DbId,
    expiry: Timestamp,
    scope: Scope,
}

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    tokens: Vec<StoredToken>,
    grants: HashMap<DbId, Vec<String>>,
    movies: Vec<Movie>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Timeout);
        }
        Ok(self.inner.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn seed(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent call fail with [`StoreError::Timeout`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    pub fn add_user(&self, input: CreateUser) -> User {
        let mut inner = self.seed();
        let user = User {
            id: inner.users.len() as DbId + 1,
            created_at: Utc::now(),
            name: input.name,
            email: input.email,
            password_hash: input.password_hash,
            activated: input.activated,
            version: 1,
        };
        inner.users.push(user.clone());
        user
    }

    pub fn grant(&self, user_id: DbId, codes: &[&str]) {
        let mut inner = self.seed();
        grant_codes(&mut inner, user_id, codes);
    }

    pub fn add_movie(&self, input: CreateMovie) -> Movie {
        let mut inner = self.seed();
        let movie = Movie {
            id: inner.movies.len() as DbId + 1,
            created_at: Utc::now(),
            title: input.title,
            year: input.year,
            runtime: input.runtime,
            genres: input.genres,
            version: 1,
        };
        inner.movies.push(movie.clone());
        movie
    }

    /// Number of stored tokens of `scope` owned by `user_id`.
    pub fn token_count(&self, user_id: DbId, scope: Scope) -> usize {
        self.seed()
            .tokens
            .iter()
            .filter(|t| t.user_id == user_id && t.scope == scope)
            .count()
    }
}

fn grant_codes(inner: &mut Inner, user_id: DbId, codes: &[&str]) {
    let granted = inner.grants.entry(user_id).or_default();
    for code in codes {
        if !granted.iter().any(|g| g == code) {
            granted.push((*code).to_string());
        }
    }
}

fn find_token(
    inner: &Inner,
    hash: &TokenHash,
    scope: Scope,
    now: Timestamp,
) -> Option<usize> {
    inner
        .tokens
        .iter()
        .position(|t| t.hash == *hash && t.scope == scope && t.expiry > now)
}

fn matches_title(movie: &Movie, title: &str) -> bool {
    let words: Vec<String> = movie
        .title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    title
        .split_whitespace()
        .all(|term| words.contains(&term.to_lowercase()))
}

fn compare_by(column: &str, a: &Movie, b: &Movie) -> Ordering {
    match column {
        "title" => a.title.cmp(&b.title),
        "year" => a.year.cmp(&b.year),
        "runtime" => a.runtime.cmp(&b.runtime),
        _ => a.id.cmp(&b.id),
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert_token(&self, token: &Token) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.tokens.push(StoredToken {
            hash: token.hash,
            user_id: token.user_id,
            expiry: token.expiry,
            scope: token.scope,
        });
        Ok(())
    }

    async fn get_user_for_token(
        &self,
        hash: &TokenHash,
        scope: Scope,
        now: Timestamp,
    ) -> Result<Option<User>, StoreError> {
        let inner = self.lock()?;
        let Some(index) = find_token(&inner, hash, scope, now) else {
            return Ok(None);
        };
        let user_id = inner.tokens[index].user_id;
        Ok(inner.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn delete_tokens_for_user(
        &self,
        user_id: DbId,
        scope: Scope,
    ) -> Result<u64, StoreError> {
        let mut inner = self.lock()?;
        let before = inner.tokens.len();
        inner
            .tokens
            .retain(|t| !(t.user_id == user_id && t.scope == scope));
        Ok((before - inner.tokens.len()) as u64)
    }

    async fn activate_with_token(
        &self,
        hash: &TokenHash,
        now: Timestamp,
    ) -> Result<Option<User>, StoreError> {
        let mut inner = self.lock()?;
        let Some(index) = find_token(&inner, hash, Scope::Activation, now) else {
            return Ok(None);
        };
        let user_id = inner.tokens.remove(index).user_id;

        let Some(user) = inner.users.iter_mut().find(|u| u.id == user_id) else {
            return Ok(None);
        };
        user.activated = true;
        user.version += 1;
        let user = user.clone();

        grant_codes(&mut inner, user_id, DEFAULT_GRANTS);
        inner
            .tokens
            .retain(|t| !(t.user_id == user_id && t.scope == Scope::Activation));
        Ok(Some(user))
    }

    async fn delete_expired_tokens(&self, now: Timestamp) -> Result<u64, StoreError> {
        let mut inner = self.lock()?;
        let before = inner.tokens.len();
        inner.tokens.retain(|t| t.expiry > now);
        Ok((before - inner.tokens.len()) as u64)
    }

    async fn get_permissions_for_user(&self, user_id: DbId) -> Result<Permissions, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .grants
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
            .into())
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn list_movies(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Movie>, Metadata), StoreError> {
        let column = filters.sort_column()?;
        if !matches!(column, "id" | "title" | "year" | "runtime") {
            return Err(InvariantViolation(format!("no movie column named {column}")).into());
        }
        let direction = filters.sort_direction();

        let inner = self.lock()?;
        let mut rows: Vec<Movie> = inner
            .movies
            .iter()
            .filter(|m| matches_title(m, title))
            .filter(|m| genres.iter().all(|g| m.genres.contains(g)))
            .cloned()
            .collect();
        drop(inner);

        rows.sort_by(|a, b| {
            let ord = compare_by(column, a, b);
            let ord = match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            ord.then(a.id.cmp(&b.id))
        });

        let total = rows.len() as i64;
        let offset = usize::try_from(filters.offset()).unwrap_or(0);
        let limit = usize::try_from(filters.limit()).unwrap_or(0);
        let page = rows.into_iter().skip(offset).take(limit).collect();

        Ok((page, calculate_metadata(total, filters.page, filters.page_size)))
    }

    async fn get_movie(&self, id: DbId) -> Result<Option<Movie>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.movies.iter().find(|m| m.id == id).cloned())
    }

    async fn update_movie(&self, movie: &Movie) -> Result<Movie, StoreError> {
        let mut inner = self.lock()?;
        let stored = inner
            .movies
            .iter_mut()
            .find(|m| m.id == movie.id && m.version == movie.version)
            .ok_or(StoreError::EditConflict)?;

        *stored = Movie {
            version: movie.version + 1,
            ..movie.clone()
        };
        Ok(stored.clone())
    }
}
