// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory message store for deterministic testing.
//!
//! `MemoryStore` implements `MessageStore` with the same observable
//! contract as the SQLite store: strictly increasing ids that survive a
//! purge. One-shot failure flags let tests drive the handler's degraded
//! paths (aborted event on write failure, history-less connection on read
//! failure).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use parley_core::{ChatMessage, MessageStore, ParleyError};

/// An in-memory message store for testing.
#[derive(Default)]
pub struct MemoryStore {
    messages: Arc<Mutex<Vec<ChatMessage>>>,
    next_id: AtomicI64,
    fail_next_append: AtomicBool,
    fail_next_read: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store; the first id assigned is 1.
    pub fn new() -> Self {
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicI64::new(0),
            fail_next_append: AtomicBool::new(false),
            fail_next_read: AtomicBool::new(false),
        }
    }

    /// Make the next `append` fail with a storage error.
    pub fn fail_next_append(&self) {
        self.fail_next_append.store(true, Ordering::SeqCst);
    }

    /// Make the next `messages_after` or `purge_all` fail with a storage error.
    pub fn fail_next_read(&self) {
        self.fail_next_read.store(true, Ordering::SeqCst);
    }

    /// Number of messages currently held.
    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    /// True when no messages are held.
    pub async fn is_empty(&self) -> bool {
        self.messages.lock().await.is_empty()
    }

    fn injected_failure(flag: &AtomicBool, what: &str) -> Option<ParleyError> {
        flag.swap(false, Ordering::SeqCst).then(|| ParleyError::Storage {
            source: format!("injected {what} failure").into(),
        })
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, content: &str, user: &str) -> Result<i64, ParleyError> {
        if let Some(err) = Self::injected_failure(&self.fail_next_append, "append") {
            return Err(err);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.messages.lock().await.push(ChatMessage {
            id,
            content: content.to_string(),
            user: user.to_string(),
        });
        Ok(id)
    }

    async fn messages_after(&self, offset: i64) -> Result<Vec<ChatMessage>, ParleyError> {
        if let Some(err) = Self::injected_failure(&self.fail_next_read, "read") {
            return Err(err);
        }
        let messages = self.messages.lock().await;
        Ok(messages
            .iter()
            .filter(|m| m.id > offset)
            .cloned()
            .collect())
    }

    async fn purge_all(&self) -> Result<u64, ParleyError> {
        if let Some(err) = Self::injected_failure(&self.fail_next_read, "purge") {
            return Err(err);
        }
        let mut messages = self.messages.lock().await;
        let deleted = messages.len() as u64;
        messages.clear();
        // next_id is deliberately not reset: ids are never reused.
        Ok(deleted)
    }
}
