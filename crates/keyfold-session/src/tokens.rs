// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session token issue and resolve.
//!
//! Tokens are opaque API credentials, deliberately unrelated to the vault's
//! key material: a stolen token lets an attacker call the API as the user,
//! but decrypting any secret still requires the key2 fragments.

use std::time::Duration;

use keyfold_core::{KeyfoldError, TokenCache};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::debug;

/// Cache key under which `token -> user_id` fields live.
pub const SESSION_CACHE_KEY: &str = "user-session";

/// Raw token length in bytes (hex-encodes to 40 chars).
pub const TOKEN_LEN: usize = 20;

/// Collisions are astronomically unlikely for 160-bit tokens; the bound
/// exists so a broken cache cannot spin this loop forever.
const MAX_ISSUE_ATTEMPTS: usize = 3;

/// Issue a fresh session token for `user_id`.
///
/// The token is written with a set-if-absent condition, so an (improbable)
/// collision with a live token draws a new one instead of silently
/// overwriting the existing session.
pub async fn issue(
    cache: &dyn TokenCache,
    user_id: i64,
    ttl: Duration,
) -> Result<String, KeyfoldError> {
    let rng = SystemRandom::new();
    for _ in 0..MAX_ISSUE_ATTEMPTS {
        let mut raw = [0u8; TOKEN_LEN];
        rng.fill(&mut raw)
            .map_err(|_| KeyfoldError::RandomnessFailure)?;
        let token = hex::encode(raw);

        if cache
            .set_if_absent(SESSION_CACHE_KEY, &token, &user_id.to_string(), ttl)
            .await?
        {
            debug!(user_id, "session issued");
            return Ok(token);
        }
    }
    Err(KeyfoldError::Internal(
        "could not place a session token after repeated collisions".to_string(),
    ))
}

/// Resolve a session token to a user id.
///
/// Missing, expired, or malformed entries are all `Unauthenticated`.
/// Resolution never extends the token's TTL.
pub async fn resolve(cache: &dyn TokenCache, token: &str) -> Result<i64, KeyfoldError> {
    let value = cache
        .get(SESSION_CACHE_KEY, token)
        .await?
        .ok_or(KeyfoldError::Unauthenticated)?;
    value.parse().map_err(|_| KeyfoldError::Unauthenticated)
}
