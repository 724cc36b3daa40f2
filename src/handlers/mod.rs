//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the Adsync service.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

use crate::error::ApiError;
use crate::models::ServiceInfo;
use crate::server::AppState;

pub mod connections;
pub mod insights;
pub mod sync_jobs;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Health check handler verifying database connectivity
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Database unreachable")
    ),
    tag = "root"
)]
pub async fn health(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    crate::db::health_check(&state.db).await.map_err(|err| {
        tracing::error!(error = %err, "Health check failed");
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database unreachable",
        )
    })?;

    Ok(StatusCode::OK)
}
