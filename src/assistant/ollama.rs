use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::resolver::{IntentResolver, ResolverStep};
use super::{AssistantError, ChatMessage, Role, ToolCall};

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Resolver backed by a local Ollama `/api/chat` endpoint with tool calling.
pub struct OllamaResolver {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaResolver {
    pub fn new(base_url: &str, model: &str) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AssistantError::HttpClient(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<ResolverStep, AssistantError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: messages.iter().map(WireMessage::from).collect(),
            tools,
            stream: false,
        };

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_connect() {
                AssistantError::OllamaConnection(self.base_url.clone())
            } else if e.is_timeout() {
                AssistantError::HttpClient(format!(
                    "Request timed out after {REQUEST_TIMEOUT_SECS}s"
                ))
            } else {
                AssistantError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::ResponseParsing(e.to_string()))?;
        parsed.into_step()
    }
}

impl IntentResolver for OllamaResolver {
    fn next_step<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        tools: &'a [Value],
    ) -> BoxFuture<'a, Result<ResolverStep, AssistantError>> {
        self.chat(messages, tools).boxed()
    }
}

// ── Wire format ─────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    tools: &'a [Value],
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: Role,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        let tool_calls = message
            .tool_call
            .as_ref()
            .and_then(|call| serde_json::to_value(call).ok())
            .map(|value| {
                vec![WireToolCall {
                    function: WireFunction {
                        name: value["name"].as_str().unwrap_or_default().to_string(),
                        arguments: value["arguments"].clone(),
                    },
                }]
            })
            .unwrap_or_default();
        Self {
            role: message.role,
            content: message.content.clone(),
            tool_calls,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: WireMessage,
}

impl ChatResponse {
    /// First tool call wins; otherwise the text content is the reply.
    fn into_step(self) -> Result<ResolverStep, AssistantError> {
        match self.message.tool_calls.into_iter().next() {
            Some(call) => ToolCall::from_parts(&call.function.name, call.function.arguments)
                .map(ResolverStep::Invoke)
                .map_err(|e| {
                    AssistantError::ResponseParsing(format!(
                        "tool call {}: {e}",
                        call.function.name
                    ))
                }),
            None => Ok(ResolverStep::Reply(self.message.content)),
        }
    }
}
