// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of configuration values.

use keyfold_core::KeyfoldError;

use crate::model::KeyfoldConfig;

/// Validate ranges and invariants that serde defaults cannot express.
pub fn validate_config(config: &KeyfoldConfig) -> Result<(), KeyfoldError> {
    if config.kdf.iterations == 0 {
        return Err(KeyfoldError::Config(
            "kdf.iterations must be at least 1".to_string(),
        ));
    }
    if config.session.ttl_secs == 0 {
        return Err(KeyfoldError::Config(
            "session.ttl_secs must be at least 1".to_string(),
        ));
    }
    if config.storage.database_path.is_empty() {
        return Err(KeyfoldError::Config(
            "storage.database_path must not be empty".to_string(),
        ));
    }
    if config.client.server_url.is_empty() {
        return Err(KeyfoldError::Config(
            "client.server_url must not be empty".to_string(),
        ));
    }
    Ok(())
}
