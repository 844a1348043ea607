// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Keyfold vault.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.
//!
//! # Usage
//!
//! ```no_run
//! let config = keyfold_config::load_and_validate().expect("config errors");
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

use keyfold_core::KeyfoldError;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::KeyfoldConfig;

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<KeyfoldConfig, KeyfoldError> {
    let config = loader::load_config().map_err(|e| KeyfoldError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    tracing::debug!(
        server = %format!("{}:{}", config.server.host, config.server.port),
        database = %config.storage.database_path,
        "configuration loaded"
    );
    Ok(config)
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<KeyfoldConfig, KeyfoldError> {
    let config =
        loader::load_config_from_str(toml_content).map_err(|e| KeyfoldError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}
