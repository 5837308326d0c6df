//! Household endpoints: subjects, family links and devices.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::core_state::CoreError;
use crate::models::subject::{Device, Subject};
use crate::monitoring::ward::MonitoredPatient;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectsResponse {
    pub self_id: u64,
    pub current_id: u64,
    pub family: Vec<Subject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFamilyRequest {
    pub device_code: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringResponse {
    pub subject_id: u64,
    pub is_monitored: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceToggleResponse {
    pub subject_id: u64,
    pub device: Device,
    pub monitoring: bool,
}

/// `GET /api/subjects`: the account holder's family, self first.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<SubjectsResponse>, ApiError> {
    let household = ctx.core.read_household()?;
    Ok(Json(SubjectsResponse {
        self_id: household.self_id(),
        current_id: household.current_id(),
        family: household.family(),
    }))
}

/// `POST /api/subjects`: link a family member by their device code.
pub async fn add_family_member(
    State(ctx): State<ApiContext>,
    Json(req): Json<AddFamilyRequest>,
) -> Result<Json<Subject>, ApiError> {
    let member = ctx
        .core
        .write_household()?
        .add_family_member(&req.device_code)
        .map_err(CoreError::from)?;
    Ok(Json(member))
}

/// `POST /api/account/register`: replace the account holder's identity.
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Subject>, ApiError> {
    let subject = ctx
        .core
        .write_household()?
        .register_self(&mut rand::thread_rng(), &req.name, &req.email)
        .map_err(CoreError::from)?;
    Ok(Json(subject))
}

pub async fn select(
    State(ctx): State<ApiContext>,
    Path(id): Path<u64>,
) -> Result<Json<Subject>, ApiError> {
    Ok(Json(ctx.core.select_subject(id)?))
}

pub async fn toggle_monitoring(
    State(ctx): State<ApiContext>,
    Path(id): Path<u64>,
) -> Result<Json<MonitoringResponse>, ApiError> {
    let is_monitored = ctx.core.toggle_monitoring(id)?;
    Ok(Json(MonitoringResponse {
        subject_id: id,
        is_monitored,
    }))
}

/// `GET /api/monitored`: live board of every subject flagged for monitoring.
pub async fn monitored(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<MonitoredPatient>>, ApiError> {
    Ok(Json(ctx.core.monitored_patients()?))
}

/// `POST /api/devices/:id/toggle`: connect or disconnect a device of the current subject.
pub async fn toggle_device(
    State(ctx): State<ApiContext>,
    Path(device_id): Path<u64>,
) -> Result<Json<DeviceToggleResponse>, ApiError> {
    let toggle = ctx.core.toggle_device(device_id)?;
    Ok(Json(DeviceToggleResponse {
        subject_id: toggle.subject_id,
        device: toggle.device,
        monitoring: toggle.any_connected,
    }))
}
