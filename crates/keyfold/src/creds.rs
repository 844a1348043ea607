// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device-side credentials file for the CLI client.
//!
//! Holds the user id, session token, and the session-code fragment -- the
//! durable half of key2. The 5-digit code is deliberately absent: it lives
//! in the user's memory and is prompted for on every secret operation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::client::ClientError;

/// Credentials persisted under the user's config directory.
#[derive(Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: i64,
    pub token: String,
    pub session_code: String,
}

pub fn credentials_path() -> Result<PathBuf, ClientError> {
    let dir = dirs::config_dir()
        .ok_or_else(|| ClientError::Credentials("no config directory available".to_string()))?;
    Ok(dir.join("keyfold").join("credentials.toml"))
}

pub fn load() -> Result<Credentials, ClientError> {
    let path = credentials_path()?;
    let content = std::fs::read_to_string(&path).map_err(|_| {
        ClientError::Credentials("no stored credentials; run `keyfold signup` first".to_string())
    })?;
    toml::from_str(&content).map_err(|e| {
        ClientError::Credentials(format!("credentials file is unreadable: {e}"))
    })
}

pub fn save(credentials: &Credentials) -> Result<(), ClientError> {
    let path = credentials_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ClientError::Credentials(format!("creating {}: {e}", parent.display())))?;
    }

    let content = toml::to_string(credentials)
        .map_err(|e| ClientError::Credentials(format!("serializing credentials: {e}")))?;
    std::fs::write(&path, content)
        .map_err(|e| ClientError::Credentials(format!("writing {}: {e}", path.display())))?;

    // The session code is key material for layer1; keep it owner-readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| ClientError::Credentials(format!("chmod {}: {e}", path.display())))?;
    }

    Ok(())
}
