// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Keyfold workspace.
//!
//! Key material fields are fixed-size arrays so corruption is caught at the
//! storage boundary, not deep inside a decryption path. None of these types
//! ever hold a plaintext key -- `key1_ciphertext` is always the AEAD-sealed
//! form, and `key2` exists only inside `keyfold-engine` per operation.

use serde::{Deserialize, Serialize};

/// AEAD nonce length in bytes (96-bit GCM nonce).
pub const NONCE_LEN: usize = 12;

/// Length of the per-user `key2` salt in bytes.
pub const SALT_LEN: usize = 16;

/// Length of the key2 verifier in bytes.
pub const VERIFIER_LEN: usize = 32;

/// A user's identity row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    /// ISO 8601 timestamp assigned by the store.
    pub created_at: String,
}

/// Per-user key material, created exactly once at signup.
#[derive(Clone)]
pub struct UserKeyRecord {
    pub user_id: i64,
    /// 16-byte `key1` sealed under the master key (includes the AEAD tag).
    pub key1_ciphertext: Vec<u8>,
    pub key1_nonce: [u8; NONCE_LEN],
    pub key2_salt: [u8; SALT_LEN],
    pub key2_verifier: [u8; VERIFIER_LEN],
}

impl std::fmt::Debug for UserKeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserKeyRecord")
            .field("user_id", &self.user_id)
            .field("key1_ciphertext", &"[sealed]")
            .field("key2_verifier", &"[redacted]")
            .finish_non_exhaustive()
    }
}

/// Key material for a user being created. The identity row and this record
/// are persisted atomically by the store.
#[derive(Clone)]
pub struct NewUserKeyMaterial {
    pub key1_ciphertext: Vec<u8>,
    pub key1_nonce: [u8; NONCE_LEN],
    pub key2_salt: [u8; SALT_LEN],
    pub key2_verifier: [u8; VERIFIER_LEN],
}

/// A stored secret: two nested AEAD layers plus the nonces needed to peel them.
#[derive(Clone)]
pub struct SecretRecord {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// layer2 = AEAD(key1, layer2_nonce, AEAD(key2, layer1_nonce, plaintext)).
    pub ciphertext: Vec<u8>,
    pub layer1_nonce: [u8; NONCE_LEN],
    pub layer2_nonce: [u8; NONCE_LEN],
}

/// A secret being inserted. `(user_id, name)` uniqueness is enforced by the
/// store as a transactional constraint.
#[derive(Clone)]
pub struct NewSecretRecord {
    pub user_id: i64,
    pub name: String,
    pub ciphertext: Vec<u8>,
    pub layer1_nonce: [u8; NONCE_LEN],
    pub layer2_nonce: [u8; NONCE_LEN],
}

/// Listing projection of a secret. Never touches encrypted material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretMeta {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

/// A secret's layer2 rewritten under a rotated `key1`.
#[derive(Clone)]
pub struct RewrappedSecret {
    pub id: i64,
    pub ciphertext: Vec<u8>,
    pub layer2_nonce: [u8; NONCE_LEN],
}

/// The outcome of enrolling a user: the fresh user id plus the two key2
/// fragments. The 5-digit `code` is surfaced exactly once and never
/// persisted server-side.
#[derive(Clone)]
pub struct Enrollment {
    pub user_id: i64,
    /// First 30 bytes of key2, hex-encoded (60 chars). Meant for durable
    /// device-side storage.
    pub session_code: String,
    /// Last 2 bytes of key2 as a zero-padded 5-digit decimal. Meant for
    /// human memory only.
    pub code: String,
}

impl std::fmt::Debug for Enrollment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enrollment")
            .field("user_id", &self.user_id)
            .field("session_code", &"[redacted]")
            .field("code", &"[redacted]")
            .finish()
    }
}
