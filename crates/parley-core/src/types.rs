// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared between the gateway, storage, and retention job.

use serde::{Deserialize, Serialize};

/// The display name used when a connection does not supply one.
pub const ANONYMOUS_USER: &str = "anonymous";

/// A persisted chat message.
///
/// `id` is assigned by the store on insert and is the sole ordering
/// authority: strictly increasing, never reused, even across purges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub content: String,
    pub user: String,
}

/// Raw handshake values as read off the WebSocket upgrade request.
///
/// Every field is optional and client-supplied; nothing is validated.
/// Call [`Handshake::resolve`] to turn this into [`ConnectParams`] —
/// malformed or missing values fall back to defaults, never an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Handshake {
    /// Display name to attach to messages sent on this connection.
    #[serde(default)]
    pub username: Option<String>,

    /// Highest message id the client has already seen, for catch-up.
    #[serde(default)]
    pub server_offset: Option<String>,

    /// Set by the client transport layer when it replayed missed events
    /// itself on automatic reconnection. A recovered connection skips
    /// the catch-up read.
    #[serde(default)]
    pub recovered: Option<String>,
}

/// Resolved per-connection parameters.
///
/// The defaulting table is `{username: default_username, server_offset: 0,
/// recovered: false}`. Resolution is a dedicated step so default behavior
/// is testable independent of transport quirks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub username: String,
    pub server_offset: i64,
    pub recovered: bool,
}

impl Handshake {
    /// Resolve raw handshake values against the defaulting table.
    ///
    /// A blank username, an unparseable offset, or any `recovered` value
    /// other than `true`/`1` all take the default silently.
    pub fn resolve(&self, default_username: &str) -> ConnectParams {
        let username = match self.username.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_username.to_string(),
        };

        let server_offset = self
            .server_offset
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(0);

        let recovered = self
            .recovered
            .as_deref()
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1"))
            .unwrap_or(false);

        ConnectParams {
            username,
            server_offset,
            recovered,
        }
    }
}
