//! `POST /api/assistant/:flow`: one user message through an assistant flow.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::assistant::{run_flow, AssistantReply, UserContext};
use crate::models::enums::AssistantFlow;

pub async fn send(
    State(ctx): State<ApiContext>,
    Path(flow): Path<String>,
    Json(context): Json<UserContext>,
) -> Result<Json<AssistantReply>, ApiError> {
    let flow: AssistantFlow = flow.parse()?;
    if context.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message is required".into()));
    }
    let reply = run_flow(&ctx.core, ctx.resolver.as_ref(), flow, &context).await?;
    Ok(Json(reply))
}
