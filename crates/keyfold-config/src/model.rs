// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Keyfold vault.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Keyfold configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeyfoldConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Key derivation settings.
    #[serde(default)]
    pub kdf: KdfConfig,

    /// Session token settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Master key provisioning settings.
    #[serde(default)]
    pub master_key: MasterKeyConfig,

    /// CLI client settings.
    #[serde(default)]
    pub client: ClientConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7350
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("keyfold").join("keyfold.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("keyfold.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Key derivation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KdfConfig {
    /// PBKDF2-HMAC-SHA256 iteration count for key2 derivation.
    ///
    /// Changing this breaks key2 reconstruction for existing users; only
    /// lower it for test deployments with disposable data.
    #[serde(default = "default_kdf_iterations")]
    pub iterations: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            iterations: default_kdf_iterations(),
        }
    }
}

fn default_kdf_iterations() -> u32 {
    1_000_000
}

/// Session token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Session token lifetime in seconds. No sliding expiration.
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl_secs(),
        }
    }
}

fn default_session_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

/// Master key provisioning configuration.
///
/// The `KEYFOLD_MASTER_KEY` environment variable (64 hex chars) takes
/// precedence over `key_file`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MasterKeyConfig {
    /// Path to a file containing the 32-byte master key, hex-encoded.
    #[serde(default)]
    pub key_file: Option<String>,
}

/// CLI client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the Keyfold server.
    #[serde(default = "default_server_url")]
    pub server_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
        }
    }
}

fn default_server_url() -> String {
    "http://127.0.0.1:7350".to_string()
}
