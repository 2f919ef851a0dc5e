use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::config::VERSION;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub environment: String,
    pub version: &'static str,
}

/// Health check response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub system_info: SystemInfo,
}

/// GET /v1/healthcheck
pub async fn healthcheck(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "available",
        system_info: SystemInfo {
            environment: state.config.environment.clone(),
            version: VERSION,
        },
    })
}
