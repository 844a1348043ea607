// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, the session middleware, and shared state.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use keyfold_core::{KeyMaterialStore, KeyfoldError, TokenCache};
use keyfold_engine::VaultEngine;

use crate::auth;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The layered encryption engine.
    pub engine: Arc<VaultEngine>,
    /// Store handle, used by the session middleware for user lookups.
    pub store: Arc<dyn KeyMaterialStore>,
    /// Session token cache.
    pub cache: Arc<dyn TokenCache>,
    /// TTL applied to newly issued session tokens.
    pub session_ttl: Duration,
}

/// Gateway server configuration (mirrors ServerConfig from keyfold-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the full router. Exposed separately from [`serve`] so tests can
/// drive it with `tower::ServiceExt::oneshot`.
pub fn build_router(state: GatewayState) -> Router {
    // Unauthenticated public routes.
    let public_routes = Router::new().route("/health", get(handlers::get_health));

    // Routes requiring a session token.
    let session_routes = Router::new()
        .route(
            "/v1/secrets",
            post(handlers::save_secret).get(handlers::list_secrets),
        )
        .route("/v1/secrets/retrieve", post(handlers::retrieve_secret))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::session_middleware,
        ))
        .with_state(state.clone());

    // Routes that establish identity rather than require it.
    let enrollment_routes = Router::new()
        .route("/v1/accounts", post(handlers::create_account))
        .route("/v1/sessions", post(handlers::login))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(enrollment_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the gateway HTTP server and serve until the process exits.
pub async fn serve(config: &ServerConfig, state: GatewayState) -> Result<(), KeyfoldError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| KeyfoldError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| KeyfoldError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyfold_engine::MasterKey;
    use keyfold_session::MemoryTokenCache;
    use keyfold_storage::SqliteStore;
    use tempfile::tempdir;

    async fn test_state() -> (GatewayState, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = keyfold_config::model::StorageConfig {
            database_path: dir.path().join("gw.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let store = Arc::new(SqliteStore::open(&config).await.unwrap());
        let engine = Arc::new(VaultEngine::new(
            MasterKey::from_bytes([0x10; 32]),
            store.clone(),
            1000,
        ));
        let state = GatewayState {
            engine,
            store,
            cache: Arc::new(MemoryTokenCache::new()),
            session_ttl: Duration::from_secs(60),
        };
        (state, dir)
    }

    #[tokio::test]
    async fn router_builds_and_state_clones() {
        let (state, _dir) = test_state().await;
        let _router = build_router(state.clone());
        let _clone = state.clone();
    }

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 7350,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
    }
}
