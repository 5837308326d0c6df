//! WebSocket push channel for the dashboard.
//!
//! Every connection receives notification toasts and vitals snapshots as
//! `{"type": ..., "data": ...}` frames, plus a heartbeat every 30 s.
//! Clients only listen; incoming text frames are ignored.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use crate::api::types::{ApiContext, PushEvent};
use crate::core_state::CoreState;

/// Heartbeat interval: server sends a heartbeat every 30 seconds.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// `GET /ws`: upgrade and start pushing events.
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(ctx): State<ApiContext>) -> impl IntoResponse {
    tracing::info!("WebSocket upgrade accepted");
    let core = ctx.core.clone();
    ws.on_upgrade(move |socket| handle_ws(socket, core))
}

/// Forward broadcasts until the client goes away or the core shuts down.
async fn handle_ws(socket: WebSocket, core: Arc<CoreState>) {
    let (mut sink, mut stream) = socket.split();
    let mut notifications = core.notifications().subscribe();
    let mut vitals = core.subscribe_vitals();

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // Consume initial immediate tick

    loop {
        let event = tokio::select! {
            msg = stream.next() => match msg {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                _ => continue,
            },
            received = notifications.recv() => match received {
                Ok(notification) => PushEvent::Notification(notification),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "WebSocket client lagging on notifications");
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
            received = vitals.recv() => match received {
                Ok(snapshot) => PushEvent::Vitals(snapshot),
                // Only the latest snapshot matters.
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
            _ = heartbeat.tick() => PushEvent::Heartbeat {
                server_time: chrono::Utc::now().to_rfc3339(),
            },
        };

        let json = match serde_json::to_string(&event) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode push event");
                continue;
            }
        };
        if sink.send(Message::Text(json)).await.is_err() {
            break;
        }
    }

    let _ = sink.close().await;
    tracing::info!("WebSocket disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router::api_router;
    use crate::api::router::tests::test_core;
    use crate::assistant::ScriptedResolver;
    use crate::notifications::Notification;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite;

    /// Serve the full router on an ephemeral port and return the WS URL.
    async fn setup_ws_server() -> (String, Arc<CoreState>, tokio::task::JoinHandle<()>) {
        let core = test_core();
        let app = api_router(core.clone(), Arc::new(ScriptedResolver::new([])));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("ws://127.0.0.1:{}/ws", addr.port()), core, handle)
    }

    async fn next_json(
        ws: &mut tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    ) -> serde_json::Value {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for push event")
            .expect("stream ended")
            .expect("WS error");
        let text = msg.into_text().expect("not text");
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn ws_pushes_notifications_and_vitals() {
        let (url, core, server) = setup_ws_server().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("WS connect failed");

        // Subscriptions are taken after the upgrade completes.
        let mut attempts = 0;
        while core.notifications().subscriber_count() == 0 && attempts < 50 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            attempts += 1;
        }

        core.notify(Notification::warning("Location unavailable", "test"));
        let parsed = next_json(&mut ws).await;
        assert_eq!(parsed["type"], "notification");
        assert_eq!(parsed["data"]["title"], "Location unavailable");
        assert_eq!(parsed["data"]["severity"], "warning");

        core.toggle_device(1).unwrap();
        core.publish_vitals(core.snapshot().unwrap());
        let parsed = next_json(&mut ws).await;
        assert_eq!(parsed["type"], "vitals");
        assert_eq!(parsed["data"]["subjectId"], 1);

        let _ = ws.send(tungstenite::Message::Close(None)).await;
        server.abort();
    }
}
