//! Assistant flows: prompt construction, tool dispatch and the resolver seam
//! behind which the language model sits.

pub mod analysis;
pub mod ollama;
pub mod orchestrator;
pub mod prompt;
pub mod resolver;
pub mod tools;

use serde::{Deserialize, Serialize};

pub use orchestrator::{run_flow, AssistantReply, MAX_TOOL_ROUNDS};
pub use prompt::UserContext;
pub use resolver::{IntentResolver, ResolverStep, ScriptedResolver};
pub use tools::ToolCall;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AssistantError {
    #[error("Cannot connect to Ollama at {0}")]
    OllamaConnection(String),
    #[error("Ollama returned HTTP {status}: {body}")]
    OllamaError { status: u16, body: String },
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("Could not parse model response: {0}")]
    ResponseParsing(String),
    #[error("Exceeded {0} tool rounds without a final reply")]
    TooManyToolRounds(usize),
    #[error("Subject data unavailable: {0}")]
    SubjectData(String),
    #[error("Scripted resolver has no step left")]
    ScriptExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One turn of the conversation handed to the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Set on assistant turns that invoked a tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    pub fn tool_result(content: impl Into<String>) -> Self {
        Self::plain(Role::Tool, content)
    }

    pub fn invocation(call: ToolCall) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            tool_call: Some(call),
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call: None,
        }
    }
}
