// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message table operations: append, ordered read-after-offset, full purge.

use rusqlite::params;

use parley_core::{ChatMessage, ParleyError};

use crate::database::Database;

/// Insert a new message and return the store-assigned id.
pub async fn insert_message(db: &Database, content: &str, user: &str) -> Result<i64, ParleyError> {
    let content = content.to_string();
    let user = user.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (content, user) VALUES (?1, ?2)",
                params![content, user],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get all messages with `id > offset`, in ascending id order.
pub async fn messages_after(db: &Database, offset: i64) -> Result<Vec<ChatMessage>, ParleyError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, content, user FROM messages WHERE id > ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![offset], |row| {
                Ok(ChatMessage {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    user: row.get(2)?,
                })
            })?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete every message. Returns the number of rows removed.
pub async fn delete_all(db: &Database) -> Result<u64, ParleyError> {
    db.connection()
        .call(|conn| {
            let deleted = conn.execute("DELETE FROM messages", [])?;
            Ok(deleted as u64)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn insert_assigns_strictly_increasing_ids() {
        let (db, _dir) = setup_db().await;

        let id1 = insert_message(&db, "first", "alice").await.unwrap();
        let id2 = insert_message(&db, "second", "bob").await.unwrap();
        let id3 = insert_message(&db, "third", "alice").await.unwrap();

        assert!(id1 < id2 && id2 < id3);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn messages_after_returns_rows_past_offset_in_order() {
        let (db, _dir) = setup_db().await;

        for i in 1..=5 {
            insert_message(&db, &format!("msg {i}"), "alice")
                .await
                .unwrap();
        }

        let all = messages_after(&db, 0).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));

        let tail = messages_after(&db, all[2].id).await.unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].content, "msg 4");
        assert_eq!(tail[1].content, "msg 5");

        // Offset at the newest id yields nothing.
        let none = messages_after(&db, all[4].id).await.unwrap();
        assert!(none.is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn messages_after_preserves_content_and_user() {
        let (db, _dir) = setup_db().await;

        let id = insert_message(&db, "hello there", "carol").await.unwrap();
        let rows = messages_after(&db, 0).await.unwrap();
        assert_eq!(
            rows,
            vec![ChatMessage {
                id,
                content: "hello there".into(),
                user: "carol".into(),
            }]
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_all_reports_count_and_empties_table() {
        let (db, _dir) = setup_db().await;

        for i in 0..3 {
            insert_message(&db, &format!("msg {i}"), "alice")
                .await
                .unwrap();
        }

        assert_eq!(delete_all(&db).await.unwrap(), 3);
        assert!(messages_after(&db, 0).await.unwrap().is_empty());

        // Purging an empty table is a no-op, not an error.
        assert_eq!(delete_all(&db).await.unwrap(), 0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_purge() {
        let (db, _dir) = setup_db().await;

        let before = insert_message(&db, "old", "alice").await.unwrap();
        delete_all(&db).await.unwrap();
        let after = insert_message(&db, "new", "bob").await.unwrap();

        assert!(
            after > before,
            "AUTOINCREMENT must keep ids increasing across purges"
        );
        db.close().await.unwrap();
    }
}
