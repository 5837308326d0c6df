//! Shared types for the HTTP API layer.

use std::sync::Arc;

use serde::Serialize;

use crate::assistant::IntentResolver;
use crate::core_state::CoreState;
use crate::notifications::Notification;

// ═══════════════════════════════════════════════════════════
// API context
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub resolver: Arc<dyn IntentResolver>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>, resolver: Arc<dyn IntentResolver>) -> Self {
        Self { core, resolver }
    }
}

// ═══════════════════════════════════════════════════════════
// Push events
// ═══════════════════════════════════════════════════════════

/// Frame pushed to dashboard WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum PushEvent {
    Notification(Notification),
    Vitals(crate::monitoring::VitalsSnapshot),
    Heartbeat {
        #[serde(rename = "serverTime")]
        server_time: String,
    },
}
