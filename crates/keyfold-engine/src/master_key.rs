// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master key provisioning.
//!
//! The 32-byte server-wide master key is loaded once at startup -- from the
//! `KEYFOLD_MASTER_KEY` environment variable (64 hex chars) or a key file --
//! held in memory for the process lifetime, and never persisted by this
//! engine.

use std::path::Path;

use keyfold_core::KeyfoldError;
use zeroize::Zeroizing;

/// The environment variable holding the hex-encoded master key.
pub const MASTER_KEY_ENV_VAR: &str = "KEYFOLD_MASTER_KEY";

/// Length of the master key in bytes.
pub const MASTER_KEY_LEN: usize = 32;

/// The process-wide master key, zeroed on drop.
pub struct MasterKey(Zeroizing<[u8; MASTER_KEY_LEN]>);

impl MasterKey {
    /// Load the master key from the environment variable or, failing that,
    /// from the configured key file.
    pub fn load(key_file: Option<&Path>) -> Result<Self, KeyfoldError> {
        if let Ok(encoded) = std::env::var(MASTER_KEY_ENV_VAR)
            && !encoded.is_empty()
        {
            return Self::from_hex(encoded.trim());
        }

        if let Some(path) = key_file {
            let encoded = std::fs::read_to_string(path).map_err(|e| {
                KeyfoldError::Config(format!("reading master key file {}: {e}", path.display()))
            })?;
            return Self::from_hex(encoded.trim());
        }

        Err(KeyfoldError::Config(format!(
            "no master key provided; set {MASTER_KEY_ENV_VAR} or master_key.key_file"
        )))
    }

    /// Decode a 64-hex-char master key.
    pub fn from_hex(encoded: &str) -> Result<Self, KeyfoldError> {
        let decoded = hex::decode(encoded)
            .map_err(|_| KeyfoldError::Config("master key is not valid hex".to_string()))?;
        let bytes: [u8; MASTER_KEY_LEN] = decoded.try_into().map_err(|_| {
            KeyfoldError::Config(format!(
                "master key must be {MASTER_KEY_LEN} bytes ({} hex chars)",
                MASTER_KEY_LEN * 2
            ))
        })?;
        Ok(Self(Zeroizing::new(bytes)))
    }

    pub fn from_bytes(bytes: [u8; MASTER_KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; MASTER_KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey([redacted])")
    }
}
