// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Parley chat relay.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.
//!
//! # Usage
//!
//! ```no_run
//! use parley_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::ParleyConfig;
pub use validation::validate_config;

use thiserror::Error;

/// A single configuration problem, either from parsing or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML/env extraction failed.
    #[error("{0}")]
    Figment(#[from] figment::Error),

    /// A semantic constraint was violated.
    #[error("{message}")]
    Validation { message: String },
}

/// Load configuration from the XDG hierarchy and validate it.
///
/// Returns either a valid [`ParleyConfig`] or the list of problems found.
pub fn load_and_validate() -> Result<ParleyConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Figment(err)]),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<ParleyConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Figment(err)]),
    }
}

/// Render configuration errors to stderr, one per line.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("config error: {error}");
    }
}
