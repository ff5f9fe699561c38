// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley chat relay.
//!
//! This crate provides the shared error type, domain types, and the
//! `MessageStore` trait that the gateway and retention job depend on.
//! The store is always an explicitly passed dependency so tests can
//! substitute an in-memory fake.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ParleyError;
pub use traits::MessageStore;
pub use types::{ANONYMOUS_USER, ChatMessage, ConnectParams, Handshake};
