//! Resolver → tool → resolver loop for one user message.

use chrono::Local;
use serde::Serialize;
use serde_json::json;

use super::prompt::{
    allowed_tools, render_health_data, render_user_prompt, system_prompt, tool_specs,
    uses_health_data, UserContext,
};
use super::resolver::{IntentResolver, ResolverStep};
use super::tools::dispatch;
use super::{AssistantError, ChatMessage};
use crate::core_state::CoreState;
use crate::models::enums::AssistantFlow;

pub const MAX_TOOL_ROUNDS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub name: String,
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    pub response: String,
    pub tool_invocations: Vec<ToolInvocation>,
}

/// Answer `context.message` within `flow`.
///
/// Tool results (or errors) are appended to the conversation and the
/// resolver is asked again, up to `MAX_TOOL_ROUNDS` times. A tool the flow
/// does not offer is not executed; the resolver gets an error result instead.
pub async fn run_flow(
    core: &CoreState,
    resolver: &dyn IntentResolver,
    flow: AssistantFlow,
    context: &UserContext,
) -> Result<AssistantReply, AssistantError> {
    let tools = tool_specs(flow);
    let allowed = allowed_tools(flow);
    let mut user_prompt = render_user_prompt(context);
    if uses_health_data(flow) {
        user_prompt = format!("{}\n{user_prompt}", health_context(core)?);
    }
    let mut messages = vec![
        ChatMessage::system(system_prompt(flow)),
        ChatMessage::user(user_prompt),
    ];
    let mut invocations = Vec::new();

    for _ in 0..=MAX_TOOL_ROUNDS {
        let call = match resolver.next_step(&messages, &tools).await? {
            ResolverStep::Reply(response) => {
                tracing::info!(flow = %flow, tools = invocations.len(), "Assistant replied");
                return Ok(AssistantReply {
                    response,
                    tool_invocations: invocations,
                });
            }
            ResolverStep::Invoke(call) => call,
        };

        if invocations.len() == MAX_TOOL_ROUNDS {
            break;
        }

        let name = call.name();
        let result = if !allowed.contains(&name) {
            tracing::warn!(flow = %flow, tool = name, "Rejected tool outside flow");
            Err(format!("Tool {name} is not available in the {flow} flow"))
        } else {
            dispatch(core, &call, Local::now().date_naive()).map_err(|e| e.to_string())
        };

        let content = match &result {
            Ok(value) => value.to_string(),
            Err(message) => json!({ "error": message }).to_string(),
        };
        invocations.push(ToolInvocation {
            name: name.to_string(),
            ok: result.is_ok(),
        });
        messages.push(ChatMessage::invocation(call));
        messages.push(ChatMessage::tool_result(content));
    }

    tracing::warn!(flow = %flow, "Assistant exceeded tool round limit");
    Err(AssistantError::TooManyToolRounds(MAX_TOOL_ROUNDS))
}

/// Health data of the current subject, with live vitals when its session runs.
fn health_context(core: &CoreState) -> Result<String, AssistantError> {
    let subject = {
        let household = core.read_household().map_err(subject_data)?;
        household.current().map_err(subject_data)?.clone()
    };
    let live = core
        .snapshot()
        .ok()
        .filter(|snapshot| snapshot.subject_id == subject.id)
        .map(|snapshot| snapshot.vitals);
    Ok(render_health_data(&subject, live.as_ref()))
}

fn subject_data(err: impl std::fmt::Display) -> AssistantError {
    AssistantError::SubjectData(err.to_string())
}
