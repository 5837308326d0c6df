//! Live vitals and daily history.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::subject::HistoricalReading;
use crate::monitoring::VitalsSnapshot;

/// `GET /api/vitals`: current snapshot, 409 while no device is connected.
pub async fn current(State(ctx): State<ApiContext>) -> Result<Json<VitalsSnapshot>, ApiError> {
    Ok(Json(ctx.core.snapshot()?))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub subject_id: u64,
    pub readings: Vec<HistoricalReading>,
}

/// `GET /api/vitals/history/:subject_id`: seven days of readings, oldest first.
pub async fn history(
    State(ctx): State<ApiContext>,
    Path(subject_id): Path<u64>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let readings = ctx
        .core
        .read_household()?
        .history(subject_id)
        .map_err(crate::core_state::CoreError::from)?;
    Ok(Json(HistoryResponse {
        subject_id,
        readings,
    }))
}
