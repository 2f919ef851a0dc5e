use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::header::{RETRY_AFTER, WWW_AUTHENTICATE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use marquee_core::error::{CoreError, InvariantViolation};
use marquee_db::StoreError;
use serde_json::{json, Value};

/// Seconds a client should wait before retrying after a transient failure.
const RETRY_AFTER_SECS: &str = "1";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `marquee_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A storage-layer error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A broken internal contract. Always a 500, always logged at error level.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

fn internal() -> (StatusCode, &'static str, Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        json!("the server encountered a problem and could not process your request"),
    )
}

fn classify_core(core: &CoreError) -> (StatusCode, &'static str, Value) {
    match core {
        CoreError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            json!("the requested resource could not be found"),
        ),
        CoreError::Validation(fields) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
            json!(fields),
        ),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", json!(msg)),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", json!(msg)),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", json!(msg)),
        CoreError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", json!(msg)),
        CoreError::Transient(msg) => {
            tracing::warn!(error = %msg, "Transient storage failure");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                json!("the server is temporarily unable to handle the request, please retry"),
            )
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Core(core) => classify_core(&core),
            AppError::Store(store) => match store.into_core() {
                Ok(core) => classify_core(&core),
                Err(violation) => {
                    tracing::error!(invariant = %violation, "Internal invariant broken, request aborted");
                    internal()
                }
            },
            AppError::Invariant(violation) => {
                tracing::error!(invariant = %violation, "Internal invariant broken, request aborted");
                internal()
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", json!(msg)),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        let mut response = (status, axum::Json(body)).into_response();
        match status {
            StatusCode::UNAUTHORIZED => {
                response
                    .headers_mut()
                    .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
            }
            _ => {}
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use marquee_core::validation::FieldErrors;

    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_of(CoreError::Validation(FieldErrors::single("page", "bad")).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(CoreError::Unauthorized("x".into()).into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(CoreError::Forbidden("x".into()).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(CoreError::NotFound { entity: "movie", id: 1 }.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(StoreError::EditConflict.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(StoreError::Timeout.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(InvariantViolation("unsafe sort".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(StoreError::Invariant(InvariantViolation("x".into())).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unauthorized_carries_bearer_challenge() {
        let response = AppError::Core(CoreError::Unauthorized("x".into())).into_response();
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn transient_carries_retry_after() {
        let response = AppError::Store(StoreError::Timeout).into_response();
        assert_eq!(response.headers()[RETRY_AFTER], RETRY_AFTER_SECS);
    }
}
