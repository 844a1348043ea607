// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Keyfold vault.

use thiserror::Error;

/// The primary error type used across the Keyfold workspace.
///
/// [`InvalidKey2`](KeyfoldError::InvalidKey2) and
/// [`DecryptionFailed`](KeyfoldError::DecryptionFailed) render identically so
/// callers cannot distinguish "wrong key" from "corrupted data" -- the API
/// boundary collapses both into one authentication-failure class.
#[derive(Debug, Error)]
pub enum KeyfoldError {
    /// Configuration errors (invalid TOML, missing required fields, bad key encoding).
    #[error("configuration error: {0}")]
    Config(String),

    /// A user name or `(user, secret name)` pair already exists.
    #[error("\"{0}\" already exists")]
    DuplicateName(String),

    /// User or secret absent from the store.
    #[error("{0} not found")]
    NotFound(String),

    /// Verifier mismatch for a candidate key2.
    #[error("authentication failed")]
    InvalidKey2,

    /// AEAD tag mismatch during decryption.
    #[error("authentication failed")]
    DecryptionFailed,

    /// The secure random source is unavailable. Fatal to the operation;
    /// never falls back to a weaker source.
    #[error("secure random source unavailable")]
    RandomnessFailure,

    /// Backing store errors (connection, query failure, corruption).
    #[error("store error: {source}")]
    StoreUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Session token cache errors.
    #[error("cache error: {0}")]
    CacheUnavailable(String),

    /// Missing, expired, or malformed session token.
    #[error("unauthorized")]
    Unauthenticated,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeyfoldError {
    /// True for the two cryptographic failure kinds that must be reported
    /// identically to callers.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            KeyfoldError::InvalidKey2 | KeyfoldError::DecryptionFailed
        )
    }
}
