// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty bind addresses and a parseable retention
//! schedule.

use croner::Cron;

use crate::ConfigError;
use crate::model::ParleyConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.chat.default_username.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "chat.default_username must not be empty".to_string(),
        });
    }

    // A malformed schedule is a startup error, not a runtime one.
    if config.retention.enabled
        && let Err(e) = config.retention.schedule.parse::<Cron>()
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "retention.schedule `{}` is not a valid cron expression: {e}",
                config.retention.schedule
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
