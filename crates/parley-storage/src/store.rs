// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the MessageStore trait.

use async_trait::async_trait;

use parley_core::{ChatMessage, MessageStore, ParleyError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed message store.
///
/// Wraps a [`Database`] handle and delegates to the typed query module.
/// Handlers and the retention job share one instance behind an
/// `Arc<dyn MessageStore>`.
pub struct SqliteMessageStore {
    db: Database,
}

impl SqliteMessageStore {
    /// Wrap an already-opened database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open (or create) the database at `path` and wrap it.
    pub async fn open(path: &str) -> Result<Self, ParleyError> {
        Ok(Self::new(Database::open(path).await?))
    }

    /// Checkpoint the WAL ahead of process exit.
    pub async fn close(&self) -> Result<(), ParleyError> {
        self.db.close().await
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn append(&self, content: &str, user: &str) -> Result<i64, ParleyError> {
        queries::messages::insert_message(&self.db, content, user).await
    }

    async fn messages_after(&self, offset: i64) -> Result<Vec<ChatMessage>, ParleyError> {
        queries::messages::messages_after(&self.db, offset).await
    }

    async fn purge_all(&self) -> Result<u64, ParleyError> {
        queries::messages::delete_all(&self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    async fn open_store() -> (Arc<SqliteMessageStore>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("store.db");
        let store = SqliteMessageStore::open(db_path.to_str().unwrap())
            .await
            .unwrap();
        (Arc::new(store), dir)
    }

    #[tokio::test]
    async fn store_round_trip_through_trait_object() {
        let (store, _dir) = open_store().await;
        let store: Arc<dyn MessageStore> = store;

        let id = store.append("hi", "alice").await.unwrap();
        let rows = store.messages_after(0).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].content, "hi");
        assert_eq!(rows[0].user, "alice");
    }

    #[tokio::test]
    async fn purge_then_append_keeps_ids_fresh() {
        let (store, _dir) = open_store().await;

        let first = store.append("one", "alice").await.unwrap();
        store.append("two", "bob").await.unwrap();
        assert_eq!(store.purge_all().await.unwrap(), 2);
        assert!(store.messages_after(0).await.unwrap().is_empty());

        let next = store.append("three", "carol").await.unwrap();
        assert!(next > first);
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_appends_serialize_on_one_writer() {
        let (store, _dir) = open_store().await;

        let mut tasks = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.append(&format!("msg {i}"), "alice").await.unwrap()
            }));
        }

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8, "every append must get a distinct id");

        let rows = store.messages_after(0).await.unwrap();
        assert_eq!(rows.len(), 8);
        assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
    }
}
