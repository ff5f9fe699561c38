// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for the Parley workspace.
//!
//! Provides an in-memory `MessageStore` fake with failure injection so the
//! connection handler and retention job can be exercised without SQLite.

pub mod memory_store;

pub use memory_store::MemoryStore;
