//! Notification history.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::notifications::Notification;

const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// `GET /api/notifications?limit=N`: newest first.
pub async fn recent(
    State(ctx): State<ApiContext>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    Ok(Json(ctx.core.notifications().recent(limit)))
}
