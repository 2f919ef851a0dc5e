#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use marquee_api::auth::password::hash_password;
use marquee_api::config::{DatabaseConfig, ServerConfig, TokenConfig};
use marquee_api::notifications::email::{EmailError, Mailer};
use marquee_api::router::build_app_router;
use marquee_api::state::AppState;
use marquee_core::types::Timestamp;
use marquee_db::models::user::{CreateUser, User};
use marquee_db::MemoryStore;

pub const PASSWORD: &str = "pa55word-for-tests";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database: DatabaseConfig {
            max_connections: 1,
            max_idle_time: Duration::from_secs(60),
            query_timeout: Duration::from_secs(3),
        },
        tokens: TokenConfig {
            authentication_ttl: chrono::Duration::hours(24),
            activation_ttl: chrono::Duration::hours(72),
            sweep_interval: Duration::from_secs(3600),
        },
    }
}

/// Records every activation token handed to it.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_activation(
        &self,
        recipient: &str,
        token: &str,
        _expiry: Timestamp,
    ) -> Result<(), EmailError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), token.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

/// Build the full application router over a fresh [`MemoryStore`], behind
/// the same middleware stack the binary uses.
pub fn build_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::default());
    let config = test_config();

    let state = AppState {
        auth_store: store.clone(),
        movie_store: store.clone(),
        config: Arc::new(config.clone()),
        mailer: mailer.clone(),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        mailer,
    }
}

/// Insert a user whose password is [`PASSWORD`].
pub fn seed_user(store: &MemoryStore, email: &str, activated: bool) -> User {
    store.add_user(CreateUser {
        name: "Test User".to_string(),
        email: email.to_string(),
        password_hash: hash_password(PASSWORD).expect("hashing should succeed"),
        activated,
    })
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, body)).await
}

pub async fn put_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, body)).await
}

pub async fn patch_json_auth(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let mut request = json_request(Method::PATCH, uri, body);
    request.headers_mut().insert(
        AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    send(app, request).await
}

pub async fn delete_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Log in through the API and return the bearer token.
pub async fn login(app: &Router, email: &str) -> String {
    let response = post_json(
        app,
        "/v1/tokens/authentication",
        serde_json::json!({ "email": email, "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let json = body_json(response).await;
    json["authentication_token"]["token"]
        .as_str()
        .unwrap()
        .to_string()
}
