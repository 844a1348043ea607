// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Keyfold vault.
//!
//! Translates wire requests into the engine's operations and engine error
//! kinds into transport responses. All cryptographic failures collapse to a
//! single 401 class on the wire.

pub mod auth;
pub mod handlers;
pub mod server;

pub use server::{build_router, serve, GatewayState, ServerConfig};
