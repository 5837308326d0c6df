//! Emergency alert endpoints.
//!
//! - `GET /api/emergency`: current episode (inactive when not monitoring)
//! - `POST /api/emergency/manual`: open a manual episode
//! - `POST /api/emergency/confirm`: send the alert now
//! - `POST /api/emergency/cancel`: cancel the countdown
//! - `GET /api/emergency/contacts`: who gets alerted

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::subject::EmergencyContact;
use crate::monitoring::emergency::Resolution;
use crate::monitoring::runtime::{cancel_alert, confirm_alert, raise_manual_alert};
use crate::monitoring::{AlertDelivery, EmergencyEpisode};
use crate::notifications::Notification;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResponse {
    pub resolution: Resolution,
    /// `false` when the alert was aborted for lack of a location.
    pub delivered: bool,
    pub notifications: Vec<Notification>,
    pub episode: EmergencyEpisode,
}

pub async fn current(State(ctx): State<ApiContext>) -> Result<Json<EmergencyEpisode>, ApiError> {
    Ok(Json(ctx.core.emergency_episode()?))
}

pub async fn manual(State(ctx): State<ApiContext>) -> Result<Json<EmergencyEpisode>, ApiError> {
    Ok(Json(raise_manual_alert(&ctx.core)?))
}

pub async fn confirm(
    State(ctx): State<ApiContext>,
) -> Result<Json<ResolutionResponse>, ApiError> {
    let delivery = confirm_alert(&ctx.core).await?;
    let delivered = matches!(delivery, AlertDelivery::Sent { .. });
    Ok(Json(ResolutionResponse {
        resolution: Resolution::Sent,
        delivered,
        notifications: delivery.notifications(),
        episode: ctx.core.emergency_episode()?,
    }))
}

pub async fn cancel(State(ctx): State<ApiContext>) -> Result<Json<ResolutionResponse>, ApiError> {
    let resolved = cancel_alert(&ctx.core)?;
    Ok(Json(ResolutionResponse {
        resolution: resolved.resolution,
        delivered: false,
        notifications: Vec::new(),
        episode: ctx.core.emergency_episode()?,
    }))
}

pub async fn contacts(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<EmergencyContact>>, ApiError> {
    Ok(Json(ctx.core.emergency_contacts()?))
}
