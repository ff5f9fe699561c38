// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the relay and its collaborators.

pub mod store;

pub use store::MessageStore;
