//! The catalog service's HTTP surface.
//!
//! Everything is served under a single versioned prefix:
//!
//! ```text
//! GET    /v1/healthcheck              open
//! POST   /v1/tokens/authentication    open, email + password -> bearer token
//! DELETE /v1/tokens/authentication    any authenticated user
//! POST   /v1/tokens/activation        open, mails a fresh activation token
//! PUT    /v1/users/activated          open, consumes an activation token
//! GET    /v1/movies                   movies:read
//! GET    /v1/movies/{id}              movies:read
//! PATCH  /v1/movies/{id}              movies:write
//! ```
//!
//! Unknown paths and unsupported methods answer with the same JSON error
//! envelope as the handlers. The binary and the integration tests both go
//! through [`build_app_router`].

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Preflight responses may be cached by the browser for this long.
const CORS_MAX_AGE: Duration = Duration::from_secs(60);

const CORS_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

async fn route_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "the requested resource could not be found",
            "code": "NOT_FOUND",
        })),
    )
        .into_response()
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": "the method is not supported for this resource",
            "code": "METHOD_NOT_ALLOWED",
        })),
    )
        .into_response()
}

/// Mount the `/v1` tree on `state` and wrap it in the request pipeline.
///
/// From the outside in: CORS, request id assignment, tracing span, request
/// id echo, timeout, panic recovery.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .nest("/v1", routes::api_routes())
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(trace)
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}

/// CORS for the configured trusted origins. Origins that are not valid
/// header values are logged and left out.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let trusted: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(trusted)
        .allow_methods(CORS_METHODS)
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(CORS_MAX_AGE)
}
