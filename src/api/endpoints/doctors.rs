//! Doctor directory endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::core_state::CoreError;
use crate::directory::{DirectoryError, Recommendation};
use crate::models::appointment::Appointment;
use crate::models::doctor::{Doctor, DoctorUpdate, NewDoctor};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub verified: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecommendRequest {
    pub symptoms: String,
    pub issue: String,
}

/// `GET /api/doctors?verified=true`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Doctor>>, ApiError> {
    Ok(Json(ctx.core.read_directory()?.list(query.verified)))
}

pub async fn register(
    State(ctx): State<ApiContext>,
    Json(new): Json<NewDoctor>,
) -> Result<Json<Doctor>, ApiError> {
    let doctor = ctx
        .core
        .write_directory()?
        .register(new)
        .map_err(CoreError::from)?;
    Ok(Json(doctor))
}

pub async fn verify(
    State(ctx): State<ApiContext>,
    Path(id): Path<u64>,
) -> Result<Json<Doctor>, ApiError> {
    let doctor = ctx
        .core
        .write_directory()?
        .verify(id)
        .map_err(CoreError::from)?;
    Ok(Json(doctor))
}

pub async fn recommend(
    State(ctx): State<ApiContext>,
    Json(req): Json<RecommendRequest>,
) -> Result<Json<Recommendation>, ApiError> {
    Ok(Json(
        ctx.core
            .read_directory()?
            .recommend(&req.symptoms, &req.issue),
    ))
}

/// `GET /api/doctor-profile`: the signed-in doctor.
pub async fn profile(State(ctx): State<ApiContext>) -> Result<Json<Doctor>, ApiError> {
    let directory = ctx.core.read_directory()?;
    let doctor = directory
        .current()
        .cloned()
        .ok_or(CoreError::Directory(DirectoryError::NoCurrentDoctor))?;
    Ok(Json(doctor))
}

/// `GET /api/doctor-profile/appointments`: the signed-in doctor's schedule.
pub async fn appointments(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    Ok(Json(ctx.core.current_doctor_appointments()?))
}

/// `PUT /api/doctor-profile`: partial update of the signed-in doctor.
pub async fn update_profile(
    State(ctx): State<ApiContext>,
    Json(update): Json<DoctorUpdate>,
) -> Result<Json<Doctor>, ApiError> {
    let doctor = ctx
        .core
        .write_directory()?
        .update_current(update)
        .map_err(CoreError::from)?;
    Ok(Json(doctor))
}
