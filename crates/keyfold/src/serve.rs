// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server composition: master key, store, cache, engine, gateway.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use keyfold_config::KeyfoldConfig;
use keyfold_core::KeyfoldError;
use keyfold_engine::{MasterKey, VaultEngine};
use keyfold_gateway::{GatewayState, ServerConfig};
use keyfold_session::MemoryTokenCache;
use keyfold_storage::SqliteStore;

/// Run the vault server until the process is stopped.
pub async fn run(config: KeyfoldConfig) -> Result<(), KeyfoldError> {
    let master_key = MasterKey::load(config.master_key.key_file.as_deref().map(Path::new))?;

    let store = Arc::new(SqliteStore::open(&config.storage).await?);
    info!(path = %config.storage.database_path, "store opened");

    let engine = Arc::new(VaultEngine::new(
        master_key,
        store.clone(),
        config.kdf.iterations,
    ));
    let cache = Arc::new(MemoryTokenCache::new());

    let state = GatewayState {
        engine,
        store,
        cache,
        session_ttl: Duration::from_secs(config.session.ttl_secs),
    };
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    keyfold_gateway::serve(&server_config, state).await
}
