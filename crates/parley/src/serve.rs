// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley serve` command implementation.
//!
//! Wires the SQLite store, the retention job, and the WebSocket gateway
//! together, then serves until SIGINT/SIGTERM.

use std::sync::Arc;

use tracing::info;

use parley_config::ParleyConfig;
use parley_core::{MessageStore, ParleyError};
use parley_cron::RetentionJob;
use parley_gateway::{GatewayState, ServerConfig};
use parley_storage::SqliteMessageStore;

use crate::shutdown;

/// Runs the `parley serve` command.
///
/// The store is opened once and passed explicitly to both the gateway and
/// the retention job; nothing reaches for ambient global state.
pub async fn run_serve(config: ParleyConfig) -> Result<(), ParleyError> {
    init_tracing(&config.server.log_level);

    info!("starting parley serve");

    let store = Arc::new(SqliteMessageStore::open(&config.storage.database_path).await?);
    info!(path = %config.storage.database_path, "sqlite store opened");

    // Install signal handler.
    let cancel = shutdown::install_signal_handler();

    // Spawn the retention job (if enabled).
    if config.retention.enabled {
        let job = RetentionJob::new(
            &config.retention.schedule,
            store.clone() as Arc<dyn MessageStore>,
        )?;
        tokio::spawn(job.run(cancel.clone()));
        info!(
            schedule = %config.retention.schedule,
            "retention job started"
        );
    } else {
        info!("retention job disabled by configuration");
    }

    // Serve the gateway until shutdown.
    let state = GatewayState::new(
        store.clone() as Arc<dyn MessageStore>,
        config.chat.default_username.clone(),
    );
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let listener = parley_gateway::bind(&server_config).await?;
    parley_gateway::serve(listener, state, cancel.clone()).await?;

    store.close().await?;
    info!("parley serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,parley={log_level},parley_core={log_level},parley_config={log_level},\
             parley_storage={log_level},parley_gateway={log_level},parley_cron={log_level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
