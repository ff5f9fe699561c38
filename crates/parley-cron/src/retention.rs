// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The scheduled purge job.
//!
//! Each fire unconditionally deletes all rows. There is no coordination
//! with in-flight connection handlers: a concurrent insert and a purge may
//! interleave arbitrarily, and the store's own atomicity is the only
//! concurrency control.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use croner::Cron;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use parley_core::{MessageStore, ParleyError};

/// Time-triggered full-table purge.
pub struct RetentionJob {
    schedule: Cron,
    store: Arc<dyn MessageStore>,
}

impl RetentionJob {
    /// Create a job from a cron expression.
    ///
    /// A malformed expression is a configuration error; the caller should
    /// fail startup rather than run without retention.
    pub fn new(schedule: &str, store: Arc<dyn MessageStore>) -> Result<Self, ParleyError> {
        let parsed = schedule.parse::<Cron>().map_err(|e| {
            ParleyError::Config(format!("invalid retention schedule `{schedule}`: {e}"))
        })?;
        Ok(Self {
            schedule: parsed,
            store,
        })
    }

    /// The next fire time strictly after `after`.
    pub fn next_occurrence(&self, after: &DateTime<Utc>) -> Result<DateTime<Utc>, ParleyError> {
        self.schedule
            .find_next_occurrence(after, false)
            .map_err(|e| ParleyError::Internal(format!("schedule evaluation failed: {e}")))
    }

    /// One purge cycle. A failure is logged and swallowed: there is no
    /// retry, and the next scheduled run is unaffected.
    pub async fn run_once(&self) {
        match self.store.purge_all().await {
            Ok(deleted) => info!(deleted, "retention purge complete"),
            Err(e) => warn!(error = %e, "retention purge failed"),
        }
    }

    /// Run the job until the token is cancelled.
    pub async fn run(self, cancel: CancellationToken) {
        loop {
            let now = Utc::now();
            let next = match self.next_occurrence(&now) {
                Ok(next) => next,
                Err(e) => {
                    error!(error = %e, "retention schedule evaluation failed, stopping job");
                    return;
                }
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            debug!(next = %next, "retention purge scheduled");

            tokio::select! {
                _ = tokio::time::sleep(wait) => self.run_once().await,
                _ = cancel.cancelled() => {
                    info!("retention job shutting down");
                    return;
                }
            }
        }
    }
}
