//! Clinical record endpoints.
//!
//! - `GET|POST /api/appointments`
//! - `GET|POST /api/prescriptions`
//! - `GET|POST /api/lab-tests`

use axum::extract::State;
use axum::Json;
use chrono::Local;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::core_state::CoreError;
use crate::models::appointment::{Appointment, AppointmentRequest};
use crate::models::prescription::{LabTestOrder, LabTestRequest, Prescription, PrescriptionRequest};
use crate::records::BookingConfirmation;

pub async fn list_appointments(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    Ok(Json(ctx.core.read_records()?.appointments().to_vec()))
}

pub async fn book_appointment(
    State(ctx): State<ApiContext>,
    Json(req): Json<AppointmentRequest>,
) -> Result<Json<BookingConfirmation>, ApiError> {
    Ok(Json(ctx.core.book_appointment(req)?))
}

pub async fn list_prescriptions(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<Prescription>>, ApiError> {
    Ok(Json(ctx.core.read_records()?.prescriptions().to_vec()))
}

pub async fn generate_prescription(
    State(ctx): State<ApiContext>,
    Json(req): Json<PrescriptionRequest>,
) -> Result<Json<Prescription>, ApiError> {
    let prescription = ctx
        .core
        .write_records()?
        .generate_prescription(req)
        .map_err(CoreError::from)?;
    Ok(Json(prescription))
}

pub async fn list_lab_tests(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<LabTestOrder>>, ApiError> {
    Ok(Json(ctx.core.read_records()?.lab_tests().to_vec()))
}

/// `POST /api/lab-tests`: dated today in local time.
pub async fn order_lab_test(
    State(ctx): State<ApiContext>,
    Json(req): Json<LabTestRequest>,
) -> Result<Json<LabTestOrder>, ApiError> {
    let order = ctx
        .core
        .write_records()?
        .order_lab_test(req, Local::now().date_naive())
        .map_err(CoreError::from)?;
    Ok(Json(order))
}
