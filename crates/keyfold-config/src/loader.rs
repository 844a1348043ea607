// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./keyfold.toml` > `~/.config/keyfold/keyfold.toml`
//! > `/etc/keyfold/keyfold.toml` with environment variable overrides via the
//! `KEYFOLD_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KeyfoldConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keyfold/keyfold.toml` (system-wide)
/// 3. `~/.config/keyfold/keyfold.toml` (user XDG config)
/// 4. `./keyfold.toml` (local directory)
/// 5. `KEYFOLD_*` environment variables
pub fn load_config() -> Result<KeyfoldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeyfoldConfig::default()))
        .merge(Toml::file("/etc/keyfold/keyfold.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("keyfold/keyfold.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("keyfold.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<KeyfoldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeyfoldConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeyfoldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeyfoldConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `KEYFOLD_STORAGE_DATABASE_PATH` must map
/// to `storage.database_path`, not `storage.database.path`.
///
/// `KEYFOLD_MASTER_KEY` itself is NOT a config key -- it carries the raw key
/// bytes and is read by the master-key provider, so it is excluded here.
fn env_provider() -> Env {
    Env::prefixed("KEYFOLD_")
        .ignore(&["master_key"])
        .map(|key| {
            let key_str = key.as_str();
            let mapped = key_str
                .replacen("server_", "server.", 1)
                .replacen("storage_", "storage.", 1)
                .replacen("kdf_", "kdf.", 1)
                .replacen("session_", "session.", 1)
                .replacen("master_key_", "master_key.", 1)
                .replacen("client_", "client.", 1);
            mapped.into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.port, 7350);
        assert_eq!(config.kdf.iterations, 1_000_000);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
            [server]
            port = 9000

            [kdf]
            iterations = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.kdf.iterations, 100);
        // Untouched sections keep their defaults.
        assert_eq!(config.session.ttl_secs, 604_800);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = load_config_from_str(
            r#"
            [server]
            prot = 9000
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_is_rejected() {
        let result = load_config_from_str(
            r#"
            [postgres]
            host = "localhost"
            "#,
        );
        assert!(result.is_err());
    }
}
