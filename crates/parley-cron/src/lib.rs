// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled message retention for the Parley chat relay.
//!
//! The retention job clears the entire message table on a fixed cron
//! schedule, independent of any live connection. Cron expression parsing is
//! delegated to `croner`.

pub mod retention;

pub use retention::RetentionJob;
