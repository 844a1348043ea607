// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level AES-GCM seal/open operations.
//!
//! Every call to [`seal`] generates a fresh random 96-bit nonce via the system
//! CSPRNG. Nonce reuse would be catastrophic for GCM security, so nonces are
//! never supplied by callers on the encrypt path.
//!
//! The algorithm is selected by key length: 16 bytes is AES-128-GCM (the
//! per-user `key1` layer), 32 bytes is AES-256-GCM (the master-key wrap and
//! the `key2` layer).

use keyfold_core::{KeyfoldError, NONCE_LEN, SALT_LEN};
use ring::aead::{Aad, Algorithm, LessSafeKey, Nonce, UnboundKey, AES_128_GCM, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};

/// Length of the per-user `key1` in bytes.
pub const KEY1_LEN: usize = 16;

fn algorithm_for(key: &[u8]) -> Result<&'static Algorithm, KeyfoldError> {
    match key.len() {
        16 => Ok(&AES_128_GCM),
        32 => Ok(&AES_256_GCM),
        n => Err(KeyfoldError::Internal(format!(
            "unsupported AEAD key length {n}"
        ))),
    }
}

fn aead_key(key: &[u8]) -> Result<LessSafeKey, KeyfoldError> {
    let unbound = UnboundKey::new(algorithm_for(key)?, key)
        .map_err(|_| KeyfoldError::Internal("failed to create AEAD key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt plaintext with AES-GCM using a fresh random 96-bit nonce.
///
/// Returns `(ciphertext_with_tag, nonce_bytes)`. The caller must store both
/// to be able to decrypt later.
pub fn seal(key: &[u8], plaintext: &[u8]) -> Result<(Vec<u8>, [u8; NONCE_LEN]), KeyfoldError> {
    let less_safe = aead_key(key)?;

    let rng = SystemRandom::new();
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| KeyfoldError::RandomnessFailure)?;

    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    // Seal in place: plaintext buffer is extended with the authentication tag.
    let mut in_out = plaintext.to_vec();
    less_safe
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| KeyfoldError::Internal("AEAD encryption failed".to_string()))?;

    Ok((in_out, nonce_bytes))
}

/// Decrypt ciphertext with AES-GCM.
///
/// `ciphertext` must include the 16-byte authentication tag appended by
/// [`seal`]. A tag mismatch (wrong key or tampered data) is
/// [`KeyfoldError::DecryptionFailed`].
pub fn open(
    key: &[u8],
    nonce_bytes: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, KeyfoldError> {
    let less_safe = aead_key(key)?;
    let nonce = Nonce::assume_unique_for_key(*nonce_bytes);

    let mut in_out = ciphertext.to_vec();
    let plaintext = less_safe
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| KeyfoldError::DecryptionFailed)?;

    Ok(plaintext.to_vec())
}

/// Generate a random 16-byte `key1`.
pub fn generate_key1() -> Result<[u8; KEY1_LEN], KeyfoldError> {
    let rng = SystemRandom::new();
    let mut key = [0u8; KEY1_LEN];
    rng.fill(&mut key)
        .map_err(|_| KeyfoldError::RandomnessFailure)?;
    Ok(key)
}

/// Generate a random 16-byte key2 salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN], KeyfoldError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| KeyfoldError::RandomnessFailure)?;
    Ok(salt)
}
