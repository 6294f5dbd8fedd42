//! WebSocket support for real-time board updates.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use turnos_core::{RefreshSummary, TicketStatus};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// Interval between heartbeats on an idle connection.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// WebSocket message sent to clients for real-time updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// A ticket was issued or changed status.
    TicketUpdate {
        ticket_id: String,
        status: TicketStatus,
    },
    /// A table was created, updated, deleted, occupied or released.
    TablesChanged,
    /// Service types were created, updated or deleted.
    ServiceTypesChanged,
    /// The whole snapshot was refetched from the backend.
    SnapshotRefreshed {
        tickets: usize,
        refreshed_at: DateTime<Utc>,
    },
    /// Server heartbeat (sent periodically to keep connection alive).
    Heartbeat { timestamp: i64 },
}

impl WsMessage {
    fn kind(&self) -> &'static str {
        match self {
            WsMessage::TicketUpdate { .. } => "ticket_update",
            WsMessage::TablesChanged => "tables_changed",
            WsMessage::ServiceTypesChanged => "service_types_changed",
            WsMessage::SnapshotRefreshed { .. } => "snapshot_refreshed",
            WsMessage::Heartbeat { .. } => "heartbeat",
        }
    }
}

/// Broadcaster for WebSocket messages using tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a message to all connected clients.
    pub fn broadcast(&self, msg: WsMessage) {
        // Ignore send errors - they just mean no one is listening
        let _ = self.sender.send(msg);
    }

    /// Subscribe to receive messages.
    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }

    pub fn ticket_updated(&self, ticket_id: &str, status: TicketStatus) {
        self.broadcast(WsMessage::TicketUpdate {
            ticket_id: ticket_id.to_string(),
            status,
        });
    }

    pub fn tables_changed(&self) {
        self.broadcast(WsMessage::TablesChanged);
    }

    pub fn service_types_changed(&self) {
        self.broadcast(WsMessage::ServiceTypesChanged);
    }

    pub fn snapshot_refreshed(&self, summary: &RefreshSummary) {
        self.broadcast(WsMessage::SnapshotRefreshed {
            tickets: summary.tickets,
            refreshed_at: summary.refreshed_at,
        });
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe to broadcast messages
    let mut rx = state.ws_broadcaster().subscribe();

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!("WebSocket client connected");

    // Spawn task to forward broadcast messages to this client
    let send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        // The first tick completes immediately.
        heartbeat.tick().await;

        loop {
            let msg = tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(msg) => msg,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("WebSocket client lagged, skipped {} messages", n);
                            WS_LAG_EVENTS.inc();
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Broadcast channel closed");
                            break;
                        }
                    }
                }
                _ = heartbeat.tick() => WsMessage::Heartbeat {
                    timestamp: Utc::now().timestamp(),
                },
            };

            WS_MESSAGES_SENT.with_label_values(&[msg.kind()]).inc();

            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, client disconnected");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize WsMessage: {}", e);
                }
            }
        }
    });

    // Handle incoming messages from client (ping/pong, close)
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Text(text)) => {
                // Clients only listen; log anything they send
                debug!("Received text message: {}", text.as_str());
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}
