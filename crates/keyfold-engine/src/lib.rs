// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key derivation and layered AEAD encryption engine for the Keyfold vault.
//!
//! A user's master password is stretched into `key2` (PBKDF2) and split into
//! a device-held session code and a memorized 5-digit code. Secrets are
//! sealed under two independent AEAD layers -- the inner under `key2`, the
//! outer under a server-generated `key1` wrapped by the process master key --
//! so either key can be rotated without touching the other.

pub mod crypto;
pub mod engine;
pub mod kdf;
pub mod master_key;
pub mod verifier;

pub use engine::VaultEngine;
pub use kdf::Key2;
pub use master_key::{MasterKey, MASTER_KEY_ENV_VAR};
