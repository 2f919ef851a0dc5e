//! Postgres-backed store tests. Each test gets a fresh database with the
//! workspace migrations applied; run with `DATABASE_URL` set and `--ignored`.

use std::time::Duration;

use assert_matches::assert_matches;
use chrono::Utc;
use marquee_core::error::InvariantViolation;
use marquee_core::filters::Filters;
use marquee_core::permissions::{MOVIES_READ, MOVIES_WRITE};
use marquee_core::runtime::Runtime;
use marquee_core::tokens::{generate_token, Scope};
use marquee_db::models::movie::CreateMovie;
use marquee_db::models::user::{CreateUser, User};
use marquee_db::repositories::{MovieRepo, PermissionRepo, UserRepo};
use marquee_db::{AuthStore, MovieStore, PgStore, StoreError};
use sqlx::PgPool;

const SAFELIST: &[&str] = &["id", "title", "year", "runtime"];

fn store(pool: PgPool) -> PgStore {
    PgStore::new(pool, Duration::from_secs(3))
}

async fn user(pool: &PgPool, email: &str, activated: bool) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            name: "Test".into(),
            email: email.into(),
            password_hash: "unused".into(),
            activated,
        },
    )
    .await
    .expect("user creation should succeed")
}

async fn movie(pool: &PgPool, title: &str, year: i32, runtime: i32, genres: &[&str]) {
    MovieRepo::create(
        pool,
        &CreateMovie {
            title: title.into(),
            year,
            runtime: Runtime(runtime),
            genres: genres.iter().map(|g| g.to_string()).collect(),
        },
    )
    .await
    .expect("movie creation should succeed");
}

fn filters(sort: &str, page: i64, page_size: i64) -> Filters {
    Filters {
        page,
        page_size,
        sort: sort.into(),
        sort_safelist: SAFELIST,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn email_lookup_is_case_insensitive(pool: PgPool) {
    let created = user(&pool, "Alice@Example.com", true).await;
    let store = store(pool);

    let found = store.get_user_by_email("alice@example.com").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(created.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn token_lookup_checks_scope_and_expiry(pool: PgPool) {
    let owner = user(&pool, "alice@example.com", true).await;
    let store = store(pool);
    let now = Utc::now();
    let token = generate_token(owner.id, chrono::Duration::hours(1), Scope::Authentication, now);
    store.insert_token(&token).await.unwrap();

    let found = store
        .get_user_for_token(&token.hash, Scope::Authentication, now)
        .await
        .unwrap();
    assert_eq!(found.map(|u| u.id), Some(owner.id));

    let wrong_scope = store
        .get_user_for_token(&token.hash, Scope::Activation, now)
        .await
        .unwrap();
    assert!(wrong_scope.is_none());

    let expired = store
        .get_user_for_token(
            &token.hash,
            Scope::Authentication,
            now + chrono::Duration::hours(2),
        )
        .await
        .unwrap();
    assert!(expired.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn activation_is_single_use_and_grants_read(pool: PgPool) {
    let owner = user(&pool, "new@example.com", false).await;
    let store = store(pool.clone());
    let now = Utc::now();
    let token = generate_token(owner.id, chrono::Duration::hours(72), Scope::Activation, now);
    let other = generate_token(owner.id, chrono::Duration::hours(72), Scope::Activation, now);
    store.insert_token(&token).await.unwrap();
    store.insert_token(&other).await.unwrap();

    let (first, second) = tokio::join!(
        store.activate_with_token(&token.hash, now),
        store.activate_with_token(&token.hash, now),
    );
    let successes = [first.unwrap(), second.unwrap()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();
    assert_eq!(successes.len(), 1);
    assert!(successes[0].activated);
    assert_eq!(successes[0].version, owner.version + 1);

    let leftover = store
        .get_user_for_token(&other.hash, Scope::Activation, now)
        .await
        .unwrap();
    assert!(leftover.is_none());

    let perms = PermissionRepo::get_all_for_user(&pool, owner.id).await.unwrap();
    assert!(perms.includes(MOVIES_READ));
    assert!(!perms.includes(MOVIES_WRITE));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn sweep_deletes_only_expired(pool: PgPool) {
    let owner = user(&pool, "alice@example.com", true).await;
    let store = store(pool);
    let now = Utc::now();
    let stale = generate_token(
        owner.id,
        chrono::Duration::hours(1),
        Scope::Authentication,
        now - chrono::Duration::hours(2),
    );
    let live = generate_token(owner.id, chrono::Duration::hours(1), Scope::Authentication, now);
    store.insert_token(&stale).await.unwrap();
    store.insert_token(&live).await.unwrap();

    assert_eq!(store.delete_expired_tokens(now).await.unwrap(), 1);
    assert_eq!(
        store
            .delete_tokens_for_user(owner.id, Scope::Authentication)
            .await
            .unwrap(),
        1
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn list_sorts_pages_and_filters(pool: PgPool) {
    movie(&pool, "Moana", 2016, 107, &["animation", "adventure"]).await;
    movie(&pool, "Black Panther", 2018, 134, &["action", "adventure"]).await;
    movie(&pool, "The Breakfast Club", 1985, 97, &["comedy", "drama"]).await;
    let store = store(pool);

    let (rows, meta) = store
        .list_movies("", &[], &filters("-runtime", 1, 2))
        .await
        .unwrap();
    let titles: Vec<_> = rows.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Black Panther", "Moana"]);
    assert_eq!(meta.total_records, 3);
    assert_eq!(meta.last_page, 2);

    let (rows, _) = store
        .list_movies("", &["adventure".to_string()], &filters("title", 1, 20))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let (rows, meta) = store
        .list_movies("breakfast", &[], &filters("id", 1, 20))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].runtime, Runtime(97));
    assert_eq!(meta.total_records, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn unsafe_sort_never_reaches_sql(pool: PgPool) {
    let store = store(pool);
    let err = store
        .list_movies("", &[], &filters("title; DROP TABLE movies", 1, 20))
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Invariant(InvariantViolation(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn stale_update_is_an_edit_conflict(pool: PgPool) {
    movie(&pool, "Moana", 2016, 107, &["animation"]).await;
    let store = store(pool);

    let mut first = store.get_movie(1).await.unwrap().expect("movie exists");
    let mut second = first.clone();

    first.title = "Moana (2016)".into();
    let updated = store.update_movie(&first).await.unwrap();
    assert_eq!(updated.version, 2);

    second.title = "Moana!".into();
    assert_matches!(
        store.update_movie(&second).await,
        Err(StoreError::EditConflict)
    );
}
