//! User-facing notifications (toasts) and their fan-out.
//!
//! Every notification is logged, kept in a bounded history for
//! `GET /api/notifications`, and broadcast to WebSocket subscribers.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

pub const HISTORY_CAPACITY: usize = 100;
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(severity: Severity, title: &str, description: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            severity,
            created_at: Utc::now(),
        }
    }

    pub fn info(title: &str, description: &str) -> Self {
        Self::new(Severity::Info, title, description)
    }

    pub fn warning(title: &str, description: &str) -> Self {
        Self::new(Severity::Warning, title, description)
    }

    pub fn destructive(title: &str, description: &str) -> Self {
        Self::new(Severity::Destructive, title, description)
    }
}

/// Anything that can present a notification to the user.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub struct NotificationCenter {
    history: Mutex<VecDeque<Notification>>,
    sender: broadcast::Sender<Notification>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            history: Mutex::new(VecDeque::with_capacity(HISTORY_CAPACITY)),
            sender,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Most recent first, at most `limit`.
    pub fn recent(&self, limit: usize) -> Vec<Notification> {
        match self.history.lock() {
            Ok(history) => history.iter().rev().take(limit).cloned().collect(),
            Err(_) => {
                tracing::error!("Notification history lock poisoned");
                Vec::new()
            }
        }
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for NotificationCenter {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Destructive => tracing::warn!(
                title = %notification.title,
                description = %notification.description,
                "Notification"
            ),
            _ => tracing::info!(
                title = %notification.title,
                description = %notification.description,
                "Notification"
            ),
        }

        if let Ok(mut history) = self.history.lock() {
            if history.len() == HISTORY_CAPACITY {
                history.pop_front();
            }
            history.push_back(notification.clone());
        }
        // No subscribers is fine.
        let _ = self.sender.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_newest_first_and_bounded() {
        let center = NotificationCenter::new();
        for i in 0..(HISTORY_CAPACITY + 5) {
            center.notify(Notification::info("n", &i.to_string()));
        }
        let recent = center.recent(HISTORY_CAPACITY + 10);
        assert_eq!(recent.len(), HISTORY_CAPACITY);
        assert_eq!(recent[0].description, (HISTORY_CAPACITY + 4).to_string());
        assert_eq!(recent.last().unwrap().description, "5");
    }

    #[tokio::test]
    async fn subscribers_receive_notifications() {
        let center = NotificationCenter::new();
        let mut rx = center.subscribe();
        center.notify(Notification::destructive("Emergency Alert Sent", "details"));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.title, "Emergency Alert Sent");
        assert_eq!(received.severity, Severity::Destructive);
    }

    #[test]
    fn serializes_for_the_dashboard() {
        let json = serde_json::to_value(Notification::warning("Alert", "HR high")).unwrap();
        assert_eq!(json["severity"], "warning");
        assert!(json["createdAt"].is_string());
    }
}
