// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All access is serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use parley_core::ParleyError;

use crate::migrations::run_migrations;

/// Handle to the single SQLite connection behind the relay.
///
/// Every query goes through [`Database::connection`] and `conn.call()`;
/// tokio-rusqlite serializes all closure calls on one background thread,
/// which eliminates SQLITE_BUSY errors under concurrent access. SQLite's
/// own atomicity (autoincrement on insert, atomic delete) is the only
/// concurrency control the relay relies on.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, ParleyError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ParleyError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| ParleyError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.busy_timeout(Duration::from_secs(5))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        // Migration errors are carried out of the closure as a value so the
        // closure itself only fails on connection-level problems.
        conn.call(|conn| Ok(run_migrations(conn)))
            .await
            .map_err(map_tr_err)??;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// Returns the underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL ahead of process exit.
    pub async fn close(&self) -> Result<(), ParleyError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into the workspace storage error.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> ParleyError {
    ParleyError::Storage {
        source: Box::new(e),
    }
}
