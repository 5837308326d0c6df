//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub monitoring: bool,
    pub version: &'static str,
}

/// `GET /api/health`: connection check for the dashboard.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "ok",
        monitoring: ctx.core.is_monitoring(),
        version: crate::config::APP_VERSION,
    }))
}
