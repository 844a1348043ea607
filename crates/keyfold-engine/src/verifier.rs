// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HKDF key2 verifier.
//!
//! The verifier is `HKDF-SHA256(key2 || master_key, salt=none,
//! info="key2-verifier", 32)`, computed at signup and stored. A candidate
//! key2 is checked by recomputing and comparing in constant time -- the
//! verifier never allows recovering key2 itself.

use keyfold_core::{KeyfoldError, VERIFIER_LEN};
use ring::{constant_time, hkdf};
use zeroize::Zeroizing;

use crate::kdf::{Key2, KEY2_LEN};
use crate::master_key::{MasterKey, MASTER_KEY_LEN};

const VERIFIER_INFO: &[u8] = b"key2-verifier";

/// Compute the verifier for a key2 under the given master key.
pub fn compute(key2: &Key2, master_key: &MasterKey) -> Result<[u8; VERIFIER_LEN], KeyfoldError> {
    let mut ikm = Zeroizing::new([0u8; KEY2_LEN + MASTER_KEY_LEN]);
    ikm[..KEY2_LEN].copy_from_slice(key2.as_bytes());
    ikm[KEY2_LEN..].copy_from_slice(master_key.as_bytes());

    let prk = hkdf::Salt::new(hkdf::HKDF_SHA256, &[]).extract(&ikm[..]);
    let okm = prk
        .expand(&[VERIFIER_INFO], hkdf::HKDF_SHA256)
        .map_err(|_| KeyfoldError::Internal("HKDF expand failed".to_string()))?;

    let mut out = [0u8; VERIFIER_LEN];
    okm.fill(&mut out)
        .map_err(|_| KeyfoldError::Internal("HKDF fill failed".to_string()))?;
    Ok(out)
}

/// Check a candidate key2 against a stored verifier in constant time.
pub fn verify(
    key2: &Key2,
    master_key: &MasterKey,
    stored: &[u8; VERIFIER_LEN],
) -> Result<bool, KeyfoldError> {
    let candidate = compute(key2, master_key)?;
    Ok(constant_time::verify_slices_are_equal(&candidate, stored).is_ok())
}
