// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket connection handler: the relay's core sequence.
//!
//! Handshake (query params on the upgrade request, all optional):
//! `username`, `server_offset`, `recovered`.
//!
//! Client -> Server (JSON):
//! ```json
//! {"content": "hello everyone"}
//! ```
//!
//! Server -> Client (JSON, both catch-up and live broadcast):
//! ```json
//! {"content": "hello everyone", "id": "42", "user": "alice"}
//! ```

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use parley_core::{ChatMessage, ConnectParams, Handshake};

use crate::server::GatewayState;

/// Chat frame from a client.
#[derive(Debug, Deserialize)]
struct WsIncoming {
    content: String,
}

/// Chat frame to a client. The id crosses the wire stringified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFrame {
    pub content: String,
    pub id: String,
    pub user: String,
}

impl From<ChatMessage> for ChatFrame {
    fn from(msg: ChatMessage) -> Self {
        Self {
            content: msg.content,
            id: msg.id.to_string(),
            user: msg.user,
        }
    }
}

/// WebSocket upgrade handler.
///
/// Resolves the handshake against the defaulting table before the upgrade,
/// then hands the socket to the per-connection task.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(handshake): Query<Handshake>,
    State(state): State<GatewayState>,
) -> Response {
    let params = handshake.resolve(&state.default_username);
    ws.on_upgrade(move |socket| handle_socket(socket, state, params))
}

/// Handle an individual WebSocket connection.
///
/// Registers an outbound sender in the client registry, replays history
/// unless the transport already recovered the connection, then loops over
/// inbound frames running persist-then-broadcast for each.
async fn handle_socket(socket: WebSocket, state: GatewayState, params: ConnectParams) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let conn_id = uuid::Uuid::new_v4().to_string();

    // Outbound frames for this connection funnel through one mpsc channel,
    // so catch-up rows and live broadcasts stay ordered per connection.
    let (tx, mut rx) = mpsc::channel::<String>(64);
    state.clients.insert(conn_id.clone(), tx.clone());

    let sender_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    info!(
        conn_id = %conn_id,
        user = %params.username,
        server_offset = params.server_offset,
        recovered = params.recovered,
        "client connected"
    );

    // The transport is trusted to have redelivered missed events on a
    // recovered connection; only fresh connections get a catch-up read.
    if !params.recovered {
        match state.store.messages_after(params.server_offset).await {
            Ok(rows) => {
                for row in rows {
                    send_frame(&tx, &ChatFrame::from(row)).await;
                }
            }
            Err(e) => {
                // Degraded mode: the connection stays usable without
                // history. No retry.
                error!(conn_id = %conn_id, error = %e, "catch-up read failed");
            }
        }
    }

    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                let text_str: &str = &text;
                let incoming: WsIncoming = match serde_json::from_str(text_str) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(conn_id = %conn_id, "invalid chat frame: {e}");
                        continue;
                    }
                };
                handle_chat_message(&state, &params.username, incoming.content).await;
            }
            Message::Close(_) => break,
            _ => {} // Ignore binary, ping (handled by the websocket layer)
        }
    }

    state.clients.remove(&conn_id);
    sender_task.abort();
    info!(conn_id = %conn_id, "client disconnected");
}

/// Persist then broadcast one inbound message.
///
/// An insert failure aborts the event: no broadcast, no retry, nothing
/// visible to the sender.
async fn handle_chat_message(state: &GatewayState, username: &str, content: String) {
    let id = match state.store.append(&content, username).await {
        Ok(id) => id,
        Err(e) => {
            error!(user = %username, error = %e, "message insert failed");
            return;
        }
    };

    let frame = ChatFrame {
        content,
        id: id.to_string(),
        user: username.to_string(),
    };
    broadcast(state, &frame).await;
}

/// Emit a frame to every registered connection, including the sender.
async fn broadcast(state: &GatewayState, frame: &ChatFrame) {
    let text = match serde_json::to_string(frame) {
        Ok(text) => text,
        Err(e) => {
            error!(error = %e, "failed to encode chat frame");
            return;
        }
    };

    // Snapshot the senders so no registry shard lock is held across await.
    let senders: Vec<mpsc::Sender<String>> = state
        .clients
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    for sender in senders {
        // A connection that disappeared mid-broadcast is simply skipped.
        let _ = sender.send(text.clone()).await;
    }
}

async fn send_frame(tx: &mpsc::Sender<String>, frame: &ChatFrame) {
    if let Ok(text) = serde_json::to_string(frame) {
        let _ = tx.send(text).await;
    }
}
