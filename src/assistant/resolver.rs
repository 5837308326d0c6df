use std::collections::VecDeque;
use std::sync::Mutex;

use futures_util::future::{self, BoxFuture, FutureExt};
use serde_json::Value;

use super::{AssistantError, ChatMessage, ToolCall};

/// What the model wants to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolverStep {
    Reply(String),
    Invoke(ToolCall),
}

/// Decides the next step of a conversation. The language model sits behind this seam.
pub trait IntentResolver: Send + Sync {
    fn next_step<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        tools: &'a [Value],
    ) -> BoxFuture<'a, Result<ResolverStep, AssistantError>>;
}

/// Replays a fixed list of steps and records every conversation it was shown.
#[derive(Default)]
pub struct ScriptedResolver {
    steps: Mutex<VecDeque<ResolverStep>>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedResolver {
    pub fn new(steps: impl IntoIterator<Item = ResolverStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Conversations passed to `next_step`, in call order.
    pub fn seen(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl IntentResolver for ScriptedResolver {
    fn next_step<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        _tools: &'a [Value],
    ) -> BoxFuture<'a, Result<ResolverStep, AssistantError>> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(messages.to_vec());
        }
        let step = self
            .steps
            .lock()
            .ok()
            .and_then(|mut steps| steps.pop_front())
            .ok_or(AssistantError::ScriptExhausted);
        future::ready(step).boxed()
    }
}
