// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the encryption engine and session layer.
//!
//! The engine never talks to SQLite or the cache directly -- it goes through
//! these traits, which the `keyfold-storage` and `keyfold-session` crates
//! implement.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::KeyfoldError;
use crate::types::{
    NewSecretRecord, NewUserKeyMaterial, RewrappedSecret, SecretMeta, SecretRecord,
    UserKeyRecord, UserRecord,
};

/// Persistent store for user identity rows, per-user key material, and
/// encrypted secrets.
///
/// Implementations must enforce `users.name` and `(secrets.user_id,
/// secrets.name)` uniqueness transactionally: concurrent inserts of the same
/// name yield exactly one success and one
/// [`DuplicateName`](KeyfoldError::DuplicateName), never two successes.
#[async_trait]
pub trait KeyMaterialStore: Send + Sync {
    /// Insert a user identity row and its key material atomically.
    /// Returns the fresh user id, or `DuplicateName` if the name exists.
    async fn create_user(
        &self,
        name: &str,
        material: &NewUserKeyMaterial,
    ) -> Result<i64, KeyfoldError>;

    /// Fetch a user's identity row.
    async fn get_user(&self, user_id: i64) -> Result<Option<UserRecord>, KeyfoldError>;

    /// Fetch a user's key material.
    async fn get_user_key_record(
        &self,
        user_id: i64,
    ) -> Result<Option<UserKeyRecord>, KeyfoldError>;

    /// Insert a secret. Returns the fresh secret id, or `DuplicateName` if
    /// `(user_id, name)` exists.
    async fn insert_secret(&self, record: &NewSecretRecord) -> Result<i64, KeyfoldError>;

    /// Fetch a secret by `(user_id, name)`.
    async fn get_secret(
        &self,
        user_id: i64,
        name: &str,
    ) -> Result<Option<SecretRecord>, KeyfoldError>;

    /// List secret metadata for a user. Any order.
    async fn list_secrets(&self, user_id: i64) -> Result<Vec<SecretMeta>, KeyfoldError>;

    /// Fetch every full secret record for a user (key1 rotation input).
    async fn list_secret_records(
        &self,
        user_id: i64,
    ) -> Result<Vec<SecretRecord>, KeyfoldError>;

    /// Replace a user's sealed `key1` and the layer2 ciphertext of every
    /// listed secret in a single transaction.
    async fn rewrap_user_secrets(
        &self,
        user_id: i64,
        key1_ciphertext: Vec<u8>,
        key1_nonce: [u8; crate::types::NONCE_LEN],
        secrets: Vec<RewrappedSecret>,
    ) -> Result<(), KeyfoldError>;
}

/// Key-value cache with hash-field semantics, used only by the session
/// token layer.
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Store `value` under `(key, field)` with a TTL, only if the field is
    /// absent (or expired). Returns false if the field already holds a live
    /// value.
    async fn set_if_absent(
        &self,
        key: &str,
        field: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, KeyfoldError>;

    /// Fetch the live value under `(key, field)`. Expired entries read as
    /// absent. Must not extend the entry's TTL.
    async fn get(&self, key: &str, field: &str) -> Result<Option<String>, KeyfoldError>;
}
