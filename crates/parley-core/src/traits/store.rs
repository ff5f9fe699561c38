// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message store trait for persistence backends (SQLite, in-memory fakes).

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::ChatMessage;

/// The durable message table behind the relay.
///
/// The connection handler and the retention job both receive the store as
/// an `Arc<dyn MessageStore>`; nothing reaches for a global handle.
/// Ordering relies entirely on the store's id assignment: ids are strictly
/// increasing in insertion order and never reused, even after [`purge_all`].
///
/// [`purge_all`]: MessageStore::purge_all
#[async_trait]
pub trait MessageStore: Send + Sync + 'static {
    /// Appends a message and returns the store-assigned id.
    async fn append(&self, content: &str, user: &str) -> Result<i64, ParleyError>;

    /// Returns all messages with `id > offset`, in ascending id order.
    async fn messages_after(&self, offset: i64) -> Result<Vec<ChatMessage>, ParleyError>;

    /// Deletes every message. Returns the number of rows removed.
    async fn purge_all(&self) -> Result<u64, ParleyError>;
}
