// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Parley chat relay.
//!
//! The gateway serves the static chat page, a health probe, and the
//! WebSocket endpoint. Each connection runs the relay's core sequence:
//! conditional catch-up from the message store on connect, then
//! persist-then-broadcast for every inbound chat frame.

pub mod handlers;
pub mod server;
pub mod ws;

pub use server::{GatewayState, ServerConfig, bind, serve};
pub use ws::ChatFrame;
