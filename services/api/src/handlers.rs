//! Axum Handlers for the REST API
//!
//! Liveness and build information. The conversation itself runs over the
//! WebSocket endpoint in `ws`.

use axum::response::Json;
use chrono::Utc;

use crate::models::{HealthResponse, VersionResponse};

/// Report that the service is up.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "Yovo API"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
    })
}

/// Report the running build's version.
#[utoipa::path(
    get,
    path = "/api/version",
    responses(
        (status = 200, description = "Service version", body = VersionResponse)
    ),
    tag = "Yovo API"
)]
pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
