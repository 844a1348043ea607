// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session token layer for the Keyfold vault.
//!
//! Issues and resolves short-lived opaque API tokens through a
//! [`keyfold_core::TokenCache`]. Orthogonal to the encryption engine: this
//! layer gates API access, not secret decryption.

pub mod cache;
pub mod tokens;

pub use cache::MemoryTokenCache;
pub use tokens::{issue, resolve, SESSION_CACHE_KEY};
